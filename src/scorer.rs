//! Filename heuristics for "how cover-like" an archive path looks

use std::cmp::Reverse;

const COVER_WEIGHT: u32 = 10;
const FRONT_WEIGHT: u32 = 8;
const TITLE_WEIGHT: u32 = 6;
const ROOT_WEIGHT: u32 = 5;
const IMAGES_DIR_WEIGHT: u32 = 3;

/// Score a path; higher means more likely to be the cover
pub fn score(path: &str) -> u32 {
    let lower = path.to_lowercase();
    let mut score = 0;

    if lower.contains("cover") {
        score += COVER_WEIGHT;
    }
    if lower.contains("front") {
        score += FRONT_WEIGHT;
    }
    if lower.contains("title") {
        score += TITLE_WEIGHT;
    }
    if !path.contains('/') {
        score += ROOT_WEIGHT;
    }
    if path.contains("images") {
        score += IMAGES_DIR_WEIGHT;
    }

    score
}

/// Order paths by descending score; equal scores keep their input order
pub fn rank<'a, I>(paths: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ranked: Vec<&str> = paths.into_iter().collect();
    // sort_by_key is stable, which keeps fuzzy search deterministic
    ranked.sort_by_key(|path| Reverse(score(path)));
    ranked
}
