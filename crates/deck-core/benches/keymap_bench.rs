//! Criterion benchmarks for key lookup and chord canonicalisation.
//!
//! Both run on the UI context for every hook edge while a hotkey is being
//! recorded, and key lookups run for every injected key.
//!
//! Run with:
//! ```bash
//! cargo bench --package deck-core --bench keymap_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deck_core::domain::chord::{canonical_combination, normalize_key_name};
use deck_core::keymap::{Key, KeyMapper};

// ── Representative inputs ─────────────────────────────────────────────────────

/// Key names as reported by the keyboard hook, aliases included.
const BENCH_KEY_NAMES: &[&str] = &[
    "a",
    "z",
    "enter",
    "esc",
    "backspace",
    "f1",
    "f16",
    "f24",
    "ctrl",
    "right ctrl",
    "alt gr",
    "shift",
    "windows",
    "page up",
    "play/pause media",
    "hyper", // unknown
];

/// Windows VK codes observed by the hook.
const BENCH_VK_CODES: &[u8] = &[
    0x41, // 'A'
    0x0D, // VK_RETURN
    0x7F, // VK_F16
    0xA2, // VK_LCONTROL
    0xA5, // VK_RMENU
    0xB3, // VK_MEDIA_PLAY_PAUSE
    0xDE, // VK_OEM_7
    0xFF, // No mapping
];

// ── Benchmarks: key name parsing ──────────────────────────────────────────────

fn bench_parse_key_names(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_names");

    group.bench_function("parse_single", |b| {
        b.iter(|| black_box("page up").parse::<Key>())
    });

    group.bench_function("parse_batch_16", |b| {
        b.iter(|| {
            BENCH_KEY_NAMES
                .iter()
                .map(|name| black_box(*name).parse::<Key>())
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

// ── Benchmarks: Windows VK translation ───────────────────────────────────────

fn bench_windows_vk(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_windows_vk");

    group.bench_function("vk_to_key_batch_8", |b| {
        b.iter(|| {
            BENCH_VK_CODES
                .iter()
                .map(|&vk| KeyMapper::windows_vk_to_key(black_box(vk)))
                .collect::<Vec<_>>()
        })
    });

    // Punctuation falls through to a table scan; compare against a letter.
    for (label, key) in [("letter", Key::Char('a')), ("punctuation", Key::Char('\''))] {
        group.bench_with_input(BenchmarkId::new("key_to_vk", label), &key, |b, &key| {
            b.iter(|| KeyMapper::key_to_windows_vk(black_box(key)))
        });
    }

    group.finish();
}

// ── Benchmarks: chord canonicalisation ───────────────────────────────────────

fn bench_chords(c: &mut Criterion) {
    let mut group = c.benchmark_group("chord");

    group.bench_function("normalize_batch_16", |b| {
        b.iter(|| {
            BENCH_KEY_NAMES
                .iter()
                .map(|name| normalize_key_name(black_box(name)))
                .collect::<Vec<_>>()
        })
    });

    group.bench_function("canonical_four_keys", |b| {
        b.iter(|| canonical_combination(black_box(["f5", "shift", "ctrl", "alt"])))
    });

    group.finish();
}

criterion_group!(benches, bench_parse_key_names, bench_windows_vk, bench_chords);
criterion_main!(benches);
