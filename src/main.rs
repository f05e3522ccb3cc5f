use std::{
	env,
	io::{self, Write},
	process::ExitCode,
};

use ariadne::{Color, Label, Report, ReportKind, Source};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dicetray::{expr::Describe, parse, Config, Engine, Error, RollOptions};

/// Name used for the expression in error reports
const SOURCE_ID: &str = "expression";

/// Maximum number of faces listed per dice term in the breakdown
const LIST_LIMIT: usize = 20;

fn main() -> ExitCode {
	// Defaults to info for this crate, can be overridden with RUST_LOG
	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "dicetray=info".into()))
		.with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
		.init();

	let input = match read_input() {
		Ok(input) => input,
		Err(err) => {
			eprintln!("Unable to read expression: {err}");
			return ExitCode::FAILURE;
		}
	};

	let config = Config::from_env();
	tracing::debug!(?config, "configuration loaded");
	let engine = Engine::new(config);

	let evaled = match engine.roll_detailed(&input, RollOptions::default().use_cache(false)) {
		Ok(evaled) => evaled,
		Err(Error::Tokenization { position, text }) => {
			report_tokenization(&input, position, &text);
			return ExitCode::FAILURE;
		}
		Err(err) => {
			eprintln!("Error: {err}");
			return ExitCode::FAILURE;
		}
	};

	println!("Rolled: {}", evaled.describe(Some(LIST_LIMIT)));
	match evaled.calc() {
		Ok(total) => {
			println!("Total: {total}");
			ExitCode::SUCCESS
		}
		Err(err) => {
			eprintln!("Error: {err}");
			ExitCode::FAILURE
		}
	}
}

/// Obtains the expression by combining all args passed to the executable, so that it can be left unquoted even with
/// spaces. Without args, the first line of stdin is used instead.
fn read_input() -> io::Result<String> {
	let args = env::args();
	if args.len() > 1 {
		return Ok(args.skip(1).collect::<Vec<String>>().join(" "));
	}

	let mut lines = io::stdin().lines();

	// If there isn't already input available in stdin, display a prompt for it
	if lines.size_hint().1.is_none() {
		print!("Enter dice expression: ");
		io::stdout().flush()?;
	}

	lines.next().unwrap_or_else(|| Ok(String::new()))
}

/// Prints a report pointing at the character that couldn't be tokenized.
/// Positions are relative to the normalized expression, so that's what gets shown.
fn report_tokenization(input: &str, position: usize, text: &str) {
	let normalized = parse::normalize(input);
	let span = position..position.saturating_add(text.chars().count().max(1));

	let report = Report::build(ReportKind::Error, (SOURCE_ID, span.clone()))
		.with_message("Unable to tokenize expression")
		.with_label(
			Label::new((SOURCE_ID, span))
				.with_message(if text.is_empty() {
					"expected a dice expression".to_owned()
				} else {
					format!("unexpected {text:?}")
				})
				.with_color(Color::Red),
		)
		.finish();

	if let Err(err) = report.eprint((SOURCE_ID, Source::from(normalized))) {
		eprintln!("Unable to print error report: {err}");
	}
}
