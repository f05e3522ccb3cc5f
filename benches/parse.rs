#![feature(test)]

extern crate test;

use test::Bencher;

use dicetray::{config::Limits, expr::Expr, parse::tokenize, validate::validate};

const COMPLEX_EXPR: &str = "4d8 + 2d10 * (3d6 - 6 / 2 * 4)";
const LONG_EXPR: &str = "(1d4 + 2d6 * 3) / 2 - (4d8 - 1) * (5d10 + 6d12 / 7) + 8d20 - (9d100 * 10 + 11) / (12 - 13d6) \
                         + ((14d2 - 15) * (16 + 17d3)) / 18 - 19d4 * (20 + 21d6 - (22 * 23d8)) + 24d10";

#[bench]
fn tokenize_basic(b: &mut Bencher) {
	let limits = Limits::default();
	b.iter(|| tokenize("4d8 + 4", &limits).unwrap());
}

#[bench]
fn tokenize_complex(b: &mut Bencher) {
	let limits = Limits::default();
	b.iter(|| tokenize(COMPLEX_EXPR, &limits).unwrap());
}

#[bench]
fn tokenize_long(b: &mut Bencher) {
	let limits = Limits::default();
	b.iter(|| tokenize(LONG_EXPR, &limits).unwrap());
}

#[bench]
fn validate_long(b: &mut Bencher) {
	let tokens = tokenize(LONG_EXPR, &Limits::default()).unwrap();
	b.iter(|| validate(&tokens).unwrap());
}

#[bench]
fn fromstr_basic(b: &mut Bencher) {
	b.iter(|| "4d8 + 4".parse::<Expr>().unwrap());
}

#[bench]
fn fromstr_complex(b: &mut Bencher) {
	b.iter(|| COMPLEX_EXPR.parse::<Expr>().unwrap());
}

#[bench]
fn fromstr_long(b: &mut Bencher) {
	b.iter(|| LONG_EXPR.parse::<Expr>().unwrap())
}
