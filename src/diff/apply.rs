use diffy::{Hunk, Line, Patch};

/// Number of context lines that may be dropped from either end of a hunk
/// when it does not match verbatim.
const MAX_FUZZ: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// The patch text is not a unified diff.
    #[error("patch does not parse: {0}")]
    Malformed(String),

    /// A hunk could not be located in the text it was applied to.
    #[error("hunk {hunk} (@@ -{old_start},{old_len}) does not match the initial text")]
    Application {
        hunk: usize,
        old_start: usize,
        old_len: usize,
    },
}

/// Parse unified diff text into a patch borrowing from `text`.
pub fn parse_patch(text: &str) -> Result<Patch<'_, str>, PatchError> {
    Patch::from_str(text).map_err(|e| PatchError::Malformed(e.to_string()))
}

/// Compute the unified diff turning `old` into `new`.
///
/// Returns `None` when the two texts are identical.
pub fn make_patch(old: &str, new: &str) -> Option<String> {
    let patch = diffy::create_patch(old, new);
    if patch.hunks().is_empty() {
        None
    } else {
        Some(patch.to_string())
    }
}

/// Apply `patch_text` to `initial`, tolerating drift between `initial` and the
/// text the patch was computed against.
///
/// Each hunk is searched for outward from its expected line, carrying the
/// offset of previously applied hunks forward. A hunk that does not match
/// verbatim is retried with up to [`MAX_FUZZ`] context lines dropped from
/// each end. Any hunk that cannot be placed fails the whole application.
pub fn apply_patch(initial: &str, patch_text: &str) -> Result<String, PatchError> {
    let patch = parse_patch(patch_text)?;
    let mut image: Vec<&str> = initial.split_inclusive('\n').collect();
    // Lines before `floor` belong to hunks that were already applied.
    let mut floor = 0usize;
    let mut offset: isize = 0;

    for (index, hunk) in patch.hunks().iter().enumerate() {
        let placed = (0..=MAX_FUZZ)
            .filter_map(|fuzz| trimmed(hunk, fuzz))
            .find_map(|fragment| {
                let expected = fragment.expected_index(offset);
                locate(&image, &fragment.old, expected, floor).map(|pos| (pos, fragment))
            });

        let Some((pos, fragment)) = placed else {
            return Err(PatchError::Application {
                hunk: index + 1,
                old_start: hunk.old_range().start(),
                old_len: hunk.old_range().len(),
            });
        };

        if pos != fragment.expected_index(offset) {
            tracing::debug!(
                hunk = index + 1,
                expected = fragment.expected_index(offset),
                actual = pos,
                fuzz = fragment.fuzz,
                "hunk applied with drift"
            );
        }

        image.splice(pos..pos + fragment.old.len(), fragment.new.iter().copied());
        floor = pos + fragment.new.len();
        offset = pos as isize - fragment.old_index as isize + fragment.new.len() as isize
            - fragment.old.len() as isize;
    }

    Ok(image.concat())
}

/// A hunk reduced to the lines it expects and the lines it produces.
struct Fragment<'a> {
    /// Zero-based line index in the pre-patch text where `old` starts.
    old_index: usize,
    old: Vec<&'a str>,
    new: Vec<&'a str>,
    fuzz: usize,
}

impl Fragment<'_> {
    fn expected_index(&self, offset: isize) -> usize {
        (self.old_index as isize + offset).max(0) as usize
    }
}

/// Build the fragment for `hunk` with up to `fuzz` context lines dropped from
/// each end. Returns `None` when `fuzz` would not drop anything more than a
/// smaller fuzz already did.
fn trimmed<'a>(hunk: &Hunk<'a, str>, fuzz: usize) -> Option<Fragment<'a>> {
    let lines = hunk.lines();
    let leading = lines
        .iter()
        .take_while(|line| matches!(line, Line::Context(_)))
        .count();
    let trailing = lines
        .iter()
        .rev()
        .take_while(|line| matches!(line, Line::Context(_)))
        .count();

    let front = leading.min(fuzz);
    let back = trailing.min(fuzz).min(lines.len() - front);
    if fuzz > 0 && front == leading.min(fuzz - 1) && back == trailing.min(fuzz - 1) {
        return None;
    }

    let body = &lines[front..lines.len() - back];
    let mut old = Vec::new();
    let mut new = Vec::new();
    for line in body {
        match line {
            Line::Context(text) => {
                old.push(*text);
                new.push(*text);
            }
            Line::Delete(text) => old.push(*text),
            Line::Insert(text) => new.push(*text),
        }
    }

    let range = hunk.old_range();
    // Trimming may not strip a hunk of every line that anchors it.
    if old.is_empty() && range.len() != 0 {
        return None;
    }

    // An empty old range names the line the insertion follows.
    let base = if range.len() == 0 {
        range.start()
    } else {
        range.start().saturating_sub(1)
    };

    Some(Fragment {
        old_index: base + front,
        old,
        new,
        fuzz,
    })
}

/// Find where `old` occurs in `image`, preferring positions closest to
/// `expected` and never starting before `floor`.
fn locate(image: &[&str], old: &[&str], expected: usize, floor: usize) -> Option<usize> {
    if image.len() < old.len() {
        return None;
    }
    let last = image.len() - old.len();
    if floor > last {
        return None;
    }
    let expected = expected.clamp(floor, last);
    let matches = |pos: usize| image[pos..pos + old.len()] == *old;

    if matches(expected) {
        return Some(expected);
    }
    let span = (expected - floor).max(last - expected);
    (1..=span).find_map(|distance| {
        let before = expected
            .checked_sub(distance)
            .filter(|pos| *pos >= floor && matches(*pos));
        let after = Some(expected + distance).filter(|pos| *pos <= last && matches(*pos));
        before.or(after)
    })
}
