use std::{
	collections::HashMap,
	ptr,
	sync::{Arc, Barrier},
	thread,
};

use crate::{
	config::{Config, Limits},
	engine::Components,
	error::{DeterministicKind, Limit, RollKind, ValidationKind},
	expr::Describe,
	parse::Operator,
	Dice, Engine, Error, RollOptions,
};

fn uncached() -> RollOptions {
	RollOptions::default().use_cache(false)
}

fn deterministic() -> RollOptions {
	RollOptions::default().deterministic(true)
}

fn table(entries: &[(&str, &[u32])]) -> Option<HashMap<String, Vec<u32>>> {
	Some(
		entries
			.iter()
			.map(|(notation, faces)| ((*notation).to_owned(), faces.to_vec()))
			.collect(),
	)
}

#[test]
fn arithmetic_without_dice() {
	let engine = Engine::default();
	assert_eq!(engine.roll("2+3*4", uncached()).unwrap(), 14);
	assert_eq!(engine.roll("(2+3)*4", uncached()).unwrap(), 20);
	assert_eq!(engine.roll("42", uncached()).unwrap(), 42);
	assert_eq!(engine.roll("5/0", uncached()), Err(Error::Roll(RollKind::DivisionByZero)));
}

#[test]
fn random_rolls_stay_in_range() {
	let engine = Engine::default();
	for _ in 0..10_000 {
		let total = engine.roll("(2D6+6)*5", uncached()).unwrap();
		assert!((40..=90).contains(&total));
	}
	for _ in 0..1000 {
		let total = engine.roll("3d6", uncached()).unwrap();
		assert!((3..=18).contains(&total));
	}
}

#[test]
fn errors_reach_the_caller() {
	let engine = Engine::default();
	assert_eq!(
		engine.roll("(3D6", uncached()),
		Err(Error::Validation(ValidationKind::UnbalancedParentheses))
	);
	assert_eq!(
		engine.roll("3D6)", uncached()),
		Err(Error::Validation(ValidationKind::UnbalancedParentheses))
	);
	assert_eq!(
		engine.roll("3D6 + x", uncached()),
		Err(Error::Tokenization {
			position: 4,
			text: "X".to_owned(),
		})
	);
	assert_eq!(
		engine.roll("101d6", uncached()),
		Err(Error::Roll(RollKind::InvalidDiceCount { count: 101, max: 100 }))
	);
	assert!(matches!(
		engine.roll(&"1+".repeat(150), uncached()),
		Err(Error::LimitExceeded {
			limit: Limit::ExpressionLength,
			..
		})
	));
}

#[test]
fn failures_are_not_cached() {
	let engine = Engine::default();
	assert!(engine.roll("5/0", RollOptions::default()).is_err());
	assert!(engine.roll("(3D6", RollOptions::default()).is_err());

	let stats = engine.cache_stats();
	assert_eq!(stats.size, 0);
	assert_eq!(stats.hits, 0);
}

#[test]
fn cached_rolls_repeat() {
	let engine = Engine::default();
	let first = engine.roll("10d100", RollOptions::default()).unwrap();
	for _ in 0..20 {
		assert_eq!(engine.roll("10D100", RollOptions::default()).unwrap(), first);
		assert_eq!(engine.roll(" 10d100 ", RollOptions::default()).unwrap(), first);
	}

	let stats = engine.cache_stats();
	assert_eq!(stats.size, 1);
	assert_eq!(stats.misses, 1);
	assert_eq!(stats.hits, 40);
	assert_eq!(stats.total_lookups, 41);
	assert!(stats.hit_rate > 97.0 && stats.hit_rate < 98.0);
	assert!(stats.last_access.is_some());
}

#[test]
fn bypassing_the_cache() {
	let engine = Engine::default();
	engine.roll("3d6", uncached()).unwrap();
	engine.roll("3d6", RollOptions::default().seed(Some(5))).unwrap();
	engine.set_deterministic_mode(true, None).unwrap();
	engine.roll("3d6", deterministic()).unwrap();

	let stats = engine.cache_stats();
	assert_eq!(stats.total_lookups, 0);
	assert_eq!(stats.size, 0);
}

#[test]
fn cache_evicts_least_recently_used() {
	let engine = Engine::new(Config::default().with_cache_capacity(3));
	let a = engine.roll("1d1000", RollOptions::default()).unwrap();
	engine.roll("2d1000", RollOptions::default()).unwrap();
	engine.roll("3d1000", RollOptions::default()).unwrap();

	// Protects 1d1000, leaving 2d1000 as the oldest
	assert_eq!(engine.roll("1d1000", RollOptions::default()).unwrap(), a);
	engine.roll("4d1000", RollOptions::default()).unwrap();

	let stats = engine.cache_stats();
	assert_eq!(stats.size, 3);
	assert_eq!(stats.max_size, 3);
	assert_eq!(stats.evictions, 1);

	assert_eq!(engine.roll("1d1000", RollOptions::default()).unwrap(), a);
	let hits = engine.cache_stats().hits;
	engine.roll("2d1000", RollOptions::default()).unwrap();
	let stats = engine.cache_stats();
	assert_eq!(stats.hits, hits);
	assert_eq!(stats.evictions, 2);
}

#[test]
fn clearing_the_cache() {
	let engine = Engine::default();
	engine.roll("1d20", RollOptions::default()).unwrap();
	engine.roll("1d20", RollOptions::default()).unwrap();

	let before = engine.clear_cache();
	assert_eq!(before.size, 1);
	assert_eq!(before.hits, 1);
	assert_eq!(before.misses, 1);

	let after = engine.cache_stats();
	assert_eq!(after.size, 0);
	assert_eq!(after.hits, 0);
	assert_eq!(after.misses, 0);
	assert_eq!(after.evictions, 0);
	assert_eq!(after.max_size, before.max_size);
	assert!(after.uptime >= before.uptime);
}

#[test]
fn deterministic_table() {
	let engine = Engine::default();
	engine.set_deterministic_mode(true, table(&[("3D6", &[3, 3, 3])])).unwrap();
	assert!(engine.is_deterministic());

	for _ in 0..10 {
		assert_eq!(engine.roll("3D6", deterministic()).unwrap(), 9);
	}
	assert_eq!(engine.roll("(3d6 + 1) * 2", deterministic()).unwrap(), 20);
	assert_eq!(engine.roll_with_details("3d6").unwrap().faces, vec![3, 3, 3]);
}

#[test]
fn deterministic_fallback_counter() {
	let engine = Engine::default();
	engine.set_deterministic_mode(true, None).unwrap();

	// Expressions that fail to validate never reach the counter
	assert_eq!(
		engine.roll("2d6+", deterministic()),
		Err(Error::Validation(ValidationKind::MissingOperand))
	);
	assert_eq!(
		engine.roll("(2d6", deterministic()),
		Err(Error::Validation(ValidationKind::UnbalancedParentheses))
	);

	assert_eq!(engine.deterministic_faces("2d6").unwrap(), vec![1, 1]);
	assert_eq!(engine.roll("2d6", deterministic()).unwrap(), 2);
	assert_eq!(engine.roll("2d6", deterministic()).unwrap(), 4);
	assert_eq!(engine.deterministic_faces("2d6").unwrap(), vec![3, 3]);

	// Each dice term advances the counter once
	assert_eq!(engine.roll("1d10 + 1d10", deterministic()).unwrap(), 3 + 4);

	// Toggling the mode starts the counter over
	engine.set_deterministic_mode(true, None).unwrap();
	assert_eq!(engine.roll("2d6", deterministic()).unwrap(), 2);
}

#[test]
fn deterministic_mode_must_be_enabled() {
	let engine = Engine::default();
	let not_enabled = Err(Error::Deterministic(DeterministicKind::ModeNotEnabled));
	assert_eq!(engine.roll("3d6", deterministic()), not_enabled);
	assert_eq!(engine.deterministic_faces("3d6").map(|_| 0), not_enabled);

	engine.set_deterministic_mode(true, None).unwrap();
	engine.set_deterministic_mode(false, table(&[("3D6", &[3])])).unwrap();
	assert!(!engine.is_deterministic());
	assert_eq!(engine.roll("3d6", deterministic()), not_enabled);
}

#[test]
fn deterministic_table_is_validated() {
	let engine = Engine::default();
	engine.set_deterministic_mode(true, table(&[("3D6", &[3])])).unwrap();

	assert_eq!(
		engine.set_deterministic_mode(true, table(&[("d6", &[1])])),
		Err(Error::Deterministic(DeterministicKind::InvalidNotation("d6".to_owned())))
	);
	assert_eq!(
		engine.set_deterministic_mode(true, table(&[("2d4", &[5])])),
		Err(Error::Deterministic(DeterministicKind::InvalidValues("2D4".to_owned())))
	);
	assert_eq!(
		engine.set_deterministic_mode(true, table(&[("500d4", &[1])])),
		Err(Error::Deterministic(DeterministicKind::InvalidNotation("500d4".to_owned())))
	);

	// The previous table is still in place
	assert_eq!(engine.roll("3D6", deterministic()).unwrap(), 9);
}

#[test]
fn seeded_rolls_are_reproducible() {
	let engine = Engine::default();
	let options = RollOptions::default().seed(Some(0xdead_beef));
	let first = engine.roll("10d100 + 5d20", options).unwrap();
	for _ in 0..10 {
		assert_eq!(engine.roll("10d100 + 5d20", options).unwrap(), first);
	}

	let other = Engine::default();
	assert_eq!(other.roll("10d100 + 5d20", options).unwrap(), first);

	let detailed = engine.roll_detailed("10d100 + 5d20", options).unwrap();
	assert_eq!(detailed.calc().unwrap(), first);
}

#[test]
fn seeded_engines_are_reproducible() {
	let first = Engine::with_seed(Config::default(), 99);
	let second = Engine::with_seed(Config::default(), 99);
	for _ in 0..10 {
		assert_eq!(
			first.roll("4d20", uncached()).unwrap(),
			second.roll("4d20", uncached()).unwrap()
		);
	}
}

#[test]
fn roll_details() {
	let engine = Engine::default();
	for _ in 0..100 {
		let details = engine.roll_with_details("3D6").unwrap();
		assert_eq!(details.faces.len(), 3);
		assert!(details.faces.iter().all(|face| (1..=6).contains(face)));
		assert_eq!(details.total, details.faces.iter().map(|&face| i64::from(face)).sum());
	}

	assert!(matches!(engine.roll_with_details("3d6+2"), Err(Error::Format(..))));
	assert!(matches!(engine.roll_with_details("42"), Err(Error::Format(..))));
	assert_eq!(engine.cache_stats().total_lookups, 0);
}

#[test]
fn detailed_rolls() {
	let engine = Engine::default();
	engine.set_deterministic_mode(true, table(&[("2D6", &[4, 5])])).unwrap();

	let evaled = engine.roll_detailed("(2d6 + 6) * 5", deterministic()).unwrap();
	assert_eq!(evaled.describe(None), "(2D6[4, 5] + 6) * 5");
	assert_eq!(evaled.faces(), vec![4, 5]);
	assert_eq!(evaled.calc().unwrap(), 75);

	assert_eq!(
		engine.roll_detailed("1/0", uncached()),
		Err(Error::Roll(RollKind::DivisionByZero))
	);
}

#[test]
fn validity_and_components() {
	let engine = Engine::default();
	assert!(engine.is_valid("(2d6+6)*5"));
	assert!(!engine.is_valid("(2d6+6*5"));
	assert!(!engine.is_valid("2d6 + ?"));
	assert!(!engine.is_valid(""));

	assert_eq!(
		engine.components("1d20 + (4 - 2d4) / 2").unwrap(),
		Components {
			dice: vec![Dice::new(1, 20), Dice::new(2, 4)],
			numbers: vec![4, 2],
			operators: vec![Operator::Add, Operator::Sub, Operator::Div],
			parentheses: vec!['(', ')'],
		}
	);
	assert!(engine.components("1d20 ! 2").is_err());
}

#[test]
fn configured_limits() {
	let limits = Limits {
		max_dice_count: 4,
		max_dice_sides: 20,
		max_expr_length: 10,
	};
	let engine = Engine::new(Config::default().with_limits(limits));
	assert_eq!(engine.config().limits, limits);

	assert!(engine.roll("4d20", uncached()).is_ok());
	assert_eq!(
		engine.roll("5d20", uncached()),
		Err(Error::Roll(RollKind::InvalidDiceCount { count: 5, max: 4 }))
	);
	assert_eq!(
		engine.roll("1d100", uncached()),
		Err(Error::Roll(RollKind::InvalidDiceSides { sides: 100, max: 20 }))
	);
	assert!(matches!(
		engine.roll("1+1+1+1+1+1", uncached()),
		Err(Error::LimitExceeded {
			limit: Limit::ExpressionLength,
			max_allowed: 10,
		})
	));
}

#[test]
fn zero_capacity_cache() {
	let engine = Engine::new(Config::default().with_cache_capacity(0));
	engine.roll("1d6", RollOptions::default()).unwrap();
	engine.roll("1d6", RollOptions::default()).unwrap();

	let stats = engine.cache_stats();
	assert_eq!(stats.size, 0);
	assert_eq!(stats.misses, 2);
	assert_eq!(stats.hits, 0);
}

#[test]
fn huge_cache_capacity() {
	let engine = Engine::new(Config::default().with_cache_capacity(usize::MAX));
	let first = engine.roll("1d6", RollOptions::default()).unwrap();
	assert_eq!(engine.roll("1d6", RollOptions::default()).unwrap(), first);

	let stats = engine.cache_stats();
	assert_eq!(stats.max_size, usize::MAX);
	assert_eq!(stats.size, 1);
	assert_eq!(stats.hits, 1);
}

#[test]
fn concurrent_misses_store_one_result() {
	const THREADS: usize = 8;

	let engine = Arc::new(Engine::default());
	let barrier = Arc::new(Barrier::new(THREADS));
	let handles = (0..THREADS)
		.map(|_| {
			let engine = Arc::clone(&engine);
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				engine.roll("10d1000", RollOptions::default()).unwrap()
			})
		})
		.collect::<Vec<_>>();
	let totals = handles
		.into_iter()
		.map(|handle| handle.join().unwrap())
		.collect::<Vec<_>>();

	let cached = engine.roll("10d1000", RollOptions::default()).unwrap();
	assert!(totals.iter().all(|&total| total == cached), "{totals:?} vs {cached}");

	let stats = engine.cache_stats();
	assert_eq!(stats.size, 1);
	assert_eq!(stats.misses, 1);
	assert_eq!(stats.hits, 8);
}

#[test]
fn shared_between_threads() {
	let engine = Arc::new(Engine::default());
	let handles = (0..4)
		.map(|_| {
			let engine = Arc::clone(&engine);
			thread::spawn(move || {
				for _ in 0..100 {
					let total = engine.roll("2d6", uncached()).unwrap();
					assert!((2..=12).contains(&total));
					engine.roll("1d4", RollOptions::default()).unwrap();
				}
			})
		})
		.collect::<Vec<_>>();

	for handle in handles {
		handle.join().unwrap();
	}

	let stats = engine.cache_stats();
	assert_eq!(stats.size, 1);
	assert_eq!(stats.total_lookups, 400);
}

#[test]
fn global_engine() {
	assert!(crate::global().is_valid("1d20"));
	assert!(ptr::eq(crate::global(), crate::global()));
}
