//! File-tree comparison primitives.
//!
//! All matching is a greedy consume over the searchee's files so a searchee
//! file can never satisfy two candidate files. Ties on length prefer files
//! with the same name, which keeps multi-file packs with repeated sizes
//! stable.

use crate::model::{FileEntry, Metafile, Searchee};

fn key<'a>(file: &'a FileEntry, by_path: bool) -> &'a str {
    if by_path {
        &file.path
    } else {
        &file.name
    }
}

/// Full tree match: every candidate file pairs with a distinct searchee
/// file of equal length and equal path (or name, for title-only searchees).
pub fn compare_file_trees(meta: &Metafile, searchee: &Searchee) -> bool {
    let by_path = searchee.compare_by_path();
    let mut pool: Vec<&FileEntry> = searchee.files.iter().collect();
    for mf in &meta.files {
        let Some(pos) = pool
            .iter()
            .position(|sf| sf.length == mf.length && key(sf, by_path) == key(mf, by_path))
        else {
            return false;
        };
        pool.swap_remove(pos);
    }
    true
}

/// Size-only bijection: lengths pair up one-to-one, names free to differ.
pub fn sizes_biject(meta_files: &[FileEntry], searchee_files: &[FileEntry]) -> bool {
    if meta_files.len() != searchee_files.len() {
        return false;
    }
    matched_length(meta_files, searchee_files) == meta_files.iter().map(|f| f.length).sum::<u64>()
}

/// Total candidate bytes consumable by a length-only greedy bijection.
pub fn matched_length(meta_files: &[FileEntry], searchee_files: &[FileEntry]) -> u64 {
    consume(meta_files, searchee_files, |sf, mf| sf.length == mf.length)
}

/// Total candidate bytes consumable when both length and path-or-name must
/// agree. Verifies a partial match after the length-only coverage check.
pub fn matched_length_verified(meta: &Metafile, searchee: &Searchee) -> u64 {
    let by_path = searchee.compare_by_path();
    consume(&meta.files, &searchee.files, |sf, mf| {
        sf.length == mf.length && key(sf, by_path) == key(mf, by_path)
    })
}

fn consume<F>(meta_files: &[FileEntry], searchee_files: &[FileEntry], matches: F) -> u64
where
    F: Fn(&FileEntry, &FileEntry) -> bool,
{
    let mut pool: Vec<&FileEntry> = searchee_files.iter().collect();
    let mut total = 0u64;
    for mf in meta_files {
        // Prefer an exact name tie among equal candidates.
        let pos = pool
            .iter()
            .position(|sf| matches(sf, mf) && sf.name == mf.name)
            .or_else(|| pool.iter().position(|sf| matches(sf, mf)));
        if let Some(pos) = pos {
            pool.swap_remove(pos);
            total += mf.length;
        }
    }
    total
}

/// Aligned-piece coverage: `floor(matched / piece_len) / ceil(total / piece_len)`.
pub fn piece_coverage(matched_bytes: u64, piece_length: u64, total_length: u64) -> f64 {
    if piece_length == 0 || total_length == 0 {
        return 0.0;
    }
    let matched_pieces = matched_bytes / piece_length;
    let total_pieces = total_length.div_ceil(piece_length);
    matched_pieces as f64 / total_pieces as f64
}
