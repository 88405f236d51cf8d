//! Line splitting for `file()`.

use crate::types::LineFlags;

/// Split `data` into lines the way `file()` reports them.
///
/// Lines keep their `\n` unless [`LineFlags::IGNORE_NEW_LINES`] is set. A
/// trailing newline ends the last line; it does not start an empty one.
pub fn split_lines(data: &[u8], flags: LineFlags) -> Vec<Vec<u8>> {
    if data.is_empty() {
        return Vec::new();
    }

    let ends_with_newline = data.last() == Some(&b'\n');
    let body = if ends_with_newline {
        &data[..data.len() - 1]
    } else {
        data
    };

    let pieces: Vec<&[u8]> = body.split(|&b| b == b'\n').collect();
    let last = pieces.len() - 1;
    let keep_newlines = !flags.contains(LineFlags::IGNORE_NEW_LINES);
    let skip_empty = flags.contains(LineFlags::SKIP_EMPTY_LINES);

    pieces
        .into_iter()
        .enumerate()
        .filter_map(|(i, piece)| {
            let mut line = piece.to_vec();
            if keep_newlines && (i < last || ends_with_newline) {
                line.push(b'\n');
            }
            (!(skip_empty && line.is_empty())).then_some(line)
        })
        .collect()
}
