// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use criterion::*;

use solar_fits::{format_comments_and_history, header_to_fits, Card, Header};

/// A header the size of an AIA level 1 header.
fn big_header() -> Header {
    let mut header = Header::new();
    header.push(Card::value("SIMPLE", true));
    header.push(Card::value("BITPIX", -32));
    header.push(Card::value("NAXIS", 2));
    header.push(Card::value("NAXIS1", 4096));
    header.push(Card::value("NAXIS2", 4096));
    for i in 0..150 {
        header.push(Card::value(format!("KEY{i}"), i as f64 * 0.25).with_comment("a float"));
        header.push(Card::value(format!("STR{i}"), "SDO/AIA"));
    }
    for i in 0..40 {
        header.push(Card::commentary("HISTORY", format!("step {i} of the pipeline")));
    }
    header
}

fn headers(c: &mut Criterion) {
    let header = big_header();
    let bytes: String = header
        .cards()
        .iter()
        .flat_map(|c| c.images())
        .chain(std::iter::once(format!("{:<80}", "END")))
        .collect();
    let meta = format_comments_and_history(&header);

    c.bench_function("parse header", |b| {
        b.iter(|| Header::parse(black_box(bytes.as_bytes())))
    });
    c.bench_function("normalise header", |b| {
        b.iter(|| format_comments_and_history(black_box(&header)))
    });
    c.bench_function("header_to_fits", |b| {
        b.iter(|| header_to_fits(black_box(&meta)))
    });
}

criterion_group!(benches, headers);
criterion_main!(benches);
