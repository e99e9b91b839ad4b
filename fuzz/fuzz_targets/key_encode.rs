#![no_main]
use libfuzzer_sys::fuzz_target;
use warp_cache::{ArgValue, Args, Fingerprint};

/// Decode the fuzz input into an argument bundle. The recipe is a flat
/// byte stream: each opcode byte picks a value shape, consuming operand
/// bytes after it. Depth is bounded so degenerate inputs cannot recurse
/// the encoder to death.
fn build_value(data: &mut &[u8], depth: u8) -> ArgValue {
    let op = take(data, 1).first().copied().unwrap_or(0);
    match op % 8 {
        0 => ArgValue::None,
        1 => ArgValue::Bool(op & 0x10 != 0),
        2 => ArgValue::Int(i64::from_le_bytes(take_array(data))),
        3 => ArgValue::Float(f64::from_bits(u64::from_le_bytes(take_array(data)))),
        4 => {
            let len = take(data, 1).first().copied().unwrap_or(0) as usize;
            let bytes = take(data, len).to_vec();
            ArgValue::Str(String::from_utf8_lossy(&bytes).into_owned())
        }
        5 => {
            let len = take(data, 1).first().copied().unwrap_or(0) as usize;
            ArgValue::Bytes(take(data, len).to_vec())
        }
        6 if depth < 4 => {
            let n = (take(data, 1).first().copied().unwrap_or(0) % 8) as usize;
            ArgValue::Seq((0..n).map(|_| build_value(data, depth + 1)).collect())
        }
        7 if depth < 4 => {
            let n = (take(data, 1).first().copied().unwrap_or(0) % 8) as usize;
            ArgValue::Map(
                (0..n)
                    .map(|i| (format!("k{i}"), build_value(data, depth + 1)))
                    .collect(),
            )
        }
        _ => ArgValue::None,
    }
}

fn take<'a>(data: &mut &'a [u8], n: usize) -> &'a [u8] {
    let n = n.min(data.len());
    let (head, tail) = data.split_at(n);
    *data = tail;
    head
}

fn take_array<const N: usize>(data: &mut &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let head = take(data, N);
    out[..head.len()].copy_from_slice(head);
    out
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = data;
    let n_pos = (take(&mut cursor, 1).first().copied().unwrap_or(0) % 8) as usize;
    let n_named = (take(&mut cursor, 1).first().copied().unwrap_or(0) % 8) as usize;

    let mut args = Args::new();
    for _ in 0..n_pos {
        args = args.arg(build_value(&mut cursor, 0));
    }
    for i in 0..n_named {
        args = args.named(format!("n{i}"), build_value(&mut cursor, 0));
    }

    // Encoding any arg tree must never panic, and must be deterministic:
    // same tree, same bytes, same hash, every time.
    let a = Fingerprint::from_args(&args);
    let b = Fingerprint::from_args(&args);
    assert_eq!(a.bytes(), b.bytes());
    assert_eq!(a.hash64(), b.hash64());
    assert_eq!(a, b);
});
