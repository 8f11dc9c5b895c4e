use diffsarif_core::DiffUnit;

/// Split a unified diff (as produced by `git diff`) into per-file units.
///
/// Files are separated by `diff --git` lines, or by a new `---`/`+++` header
/// pair once the previous file's hunks are complete (plain `diff -ru` output). Each unit keeps only the hunk body, starting at the
/// first `@@` header, so the `index`, `---` and `+++` lines never reach the
/// model. Deleted and binary files are skipped.
///
/// # Examples
///
/// ```
/// use diffsarif_gitdiff::split_unified_diff;
///
/// let diff = "diff --git a/app.py b/app.py\n\
///             index 1111111..2222222 100644\n\
///             --- a/app.py\n\
///             +++ b/app.py\n\
///             @@ -1,2 +1,3 @@\n\
///              import os\n\
///             +import sys\n";
/// let units = split_unified_diff(diff);
/// assert_eq!(units.len(), 1);
/// assert_eq!(units[0].filename, "app.py");
/// assert!(units[0].diff_text.starts_with("@@ -1,2 +1,3 @@"));
/// ```
pub fn split_unified_diff(input: &str) -> Vec<DiffUnit> {
    let mut units = Vec::new();
    let mut current: Option<FileSection> = None;

    for line in input.lines() {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            flush(&mut units, current.take());
            current = Some(FileSection::new(git_header_path(rest)));
            continue;
        }
        // Plain `diff -u`/`diff -ru` output has no `diff --git` separator: a
        // `---` line after a finished hunk opens the next file.
        if line.starts_with("--- ") && current.as_ref().is_some_and(FileSection::between_hunks) {
            flush(&mut units, current.take());
        }
        current
            .get_or_insert_with(|| FileSection::new(None))
            .push_line(line);
    }
    flush(&mut units, current.take());

    units
}

/// Strip the file header of a single-file patch, keeping everything from the
/// first `@@` line on.
pub(crate) fn hunk_body(patch: &str) -> String {
    let mut section = FileSection::new(None);
    for line in patch.lines() {
        if !line.starts_with("diff --git ") {
            section.push_line(line);
        }
    }
    section.body
}

#[derive(Debug)]
struct FileSection {
    path: Option<String>,
    body: String,
    in_body: bool,
    /// Old and new lines left in the current hunk; `None` if the header
    /// could not be read.
    hunk_left: Option<(u32, u32)>,
    deleted: bool,
    binary: bool,
}

impl FileSection {
    fn new(path: Option<String>) -> Self {
        Self {
            path,
            body: String::new(),
            in_body: false,
            hunk_left: None,
            deleted: false,
            binary: false,
        }
    }

    fn push_line(&mut self, line: &str) {
        if !self.in_body {
            if let Some(target) = line.strip_prefix("+++ ") {
                match target_path(target) {
                    Some(path) => self.path = Some(path),
                    None => self.deleted = true,
                }
                return;
            }
            if line.starts_with("deleted file mode") {
                self.deleted = true;
                return;
            }
            if line.starts_with("Binary files ") || line == "GIT binary patch" {
                self.binary = true;
                return;
            }
            if !line.starts_with("@@") {
                return;
            }
            self.in_body = true;
        }

        if line.starts_with("@@") {
            self.hunk_left = hunk_counts(line);
        } else if line.starts_with('\\') {
            // "\ No newline at end of file"
        } else if let Some((old, new)) = self.hunk_left.as_mut() {
            if *old == 0 && *new == 0 {
                // Between hunks, e.g. the `diff -ru` command line.
                return;
            }
            match line.as_bytes().first() {
                Some(b'-') => *old = old.saturating_sub(1),
                Some(b'+') => *new = new.saturating_sub(1),
                _ => {
                    *old = old.saturating_sub(1);
                    *new = new.saturating_sub(1);
                }
            }
        }
        self.body.push_str(line);
        self.body.push('\n');
    }

    /// `true` once the last hunk seen has consumed all of its lines.
    fn between_hunks(&self) -> bool {
        self.in_body && self.hunk_left == Some((0, 0))
    }

    fn into_unit(self) -> Option<DiffUnit> {
        if self.deleted || self.binary {
            return None;
        }
        let path = self.path.filter(|p| !p.is_empty())?;
        Some(DiffUnit::new(path, self.body))
    }
}

fn flush(units: &mut Vec<DiffUnit>, section: Option<FileSection>) {
    if let Some(unit) = section.and_then(FileSection::into_unit) {
        units.push(unit);
    }
}

/// Path from the `a/<old> b/<new>` part of a `diff --git` line.
fn git_header_path(rest: &str) -> Option<String> {
    rest.rsplit_once(" b/").map(|(_, path)| path.to_string())
}

/// Old and new line counts from a `@@ -a,b +c,d @@` header. A missing count
/// means one line.
fn hunk_counts(header: &str) -> Option<(u32, u32)> {
    let mut ranges = header.strip_prefix("@@ ")?.split_whitespace();
    let old = range_len(ranges.next()?.strip_prefix('-')?)?;
    let new = range_len(ranges.next()?.strip_prefix('+')?)?;
    Some((old, new))
}

fn range_len(range: &str) -> Option<u32> {
    match range.split_once(',') {
        Some((_, len)) => len.parse().ok(),
        None => Some(1),
    }
}

/// Path from a `+++` line, `None` for `/dev/null`.
fn target_path(target: &str) -> Option<String> {
    // Plain `diff -u` output appends a tab and a timestamp.
    let target = target.split('\t').next().unwrap_or(target).trim();
    if target == "/dev/null" {
        return None;
    }
    Some(target.strip_prefix("b/").unwrap_or(target).to_string())
}
