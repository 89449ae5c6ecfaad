//! Pair source and target references by relative path.

use std::path::PathBuf;

use crate::discovery::ReferenceSet;

/// A source reference and its target counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePair {
    pub relative_path: PathBuf,
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Outcome of pairing two reference sets.
#[derive(Debug, Clone, Default)]
pub struct Pairing {
    /// Paths present in both sets, in source discovery order
    pub pairs: Vec<ReferencePair>,
    /// Relative paths with no target counterpart
    pub source_only: Vec<PathBuf>,
    /// Relative paths with no source counterpart
    pub target_only: Vec<PathBuf>,
}

/// Match every source reference with the target at the same relative path.
///
/// Each path in the intersection appears exactly once in `pairs`; the rest
/// is listed per side so the caller can decide whether to skip or report it.
pub fn pair_references(source: &ReferenceSet, target: &ReferenceSet) -> Pairing {
    let mut pairing = Pairing::default();

    for (relative, source_path) in source.iter() {
        match target.get(relative) {
            Some(target_path) => pairing.pairs.push(ReferencePair {
                relative_path: relative.to_path_buf(),
                source: source_path.to_path_buf(),
                target: target_path.to_path_buf(),
            }),
            None => pairing.source_only.push(relative.to_path_buf()),
        }
    }

    pairing.target_only = target
        .iter()
        .filter(|(relative, _)| !source.contains(relative))
        .map(|(relative, _)| relative.to_path_buf())
        .collect();

    pairing
}
