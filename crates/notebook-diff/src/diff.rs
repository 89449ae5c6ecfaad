//! Line-based unified diff.
//!
//! Edit scripts come from Myers' O((N+M)D) algorithm; hunks and range
//! headers follow the classic unified format (`@@ -a,b +c,d @@`), including
//! the single-line and empty-range conventions.

/// One step of an edit script, with indices into the old/new line lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Equal(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// Unified diff of two texts. Returns an empty string when they are equal.
pub fn unified_diff(old: &str, new: &str, old_label: &str, new_label: &str, context: usize) -> String {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();
    let edits = shortest_edit(&a, &b);

    let changes: Vec<usize> = edits
        .iter()
        .enumerate()
        .filter(|(_, e)| !matches!(e, Edit::Equal(..)))
        .map(|(i, _)| i)
        .collect();
    if changes.is_empty() {
        return String::new();
    }

    // Group changes whose context windows touch or overlap
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for &i in &changes {
        let start = i.saturating_sub(context);
        let end = (i + context + 1).min(edits.len());
        match hunks.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => hunks.push((start, end)),
        }
    }

    // Line positions in old/new before each edit
    let mut positions = Vec::with_capacity(edits.len() + 1);
    let (mut ai, mut bi) = (0usize, 0usize);
    for edit in &edits {
        positions.push((ai, bi));
        match edit {
            Edit::Equal(..) => {
                ai += 1;
                bi += 1;
            }
            Edit::Delete(_) => ai += 1,
            Edit::Insert(_) => bi += 1,
        }
    }
    positions.push((ai, bi));

    let mut out = format!("--- {}\n+++ {}\n", old_label, new_label);
    for (start, end) in hunks {
        let (a_start, b_start) = positions[start];
        let (a_end, b_end) = positions[end];
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            format_range(a_start, a_end),
            format_range(b_start, b_end)
        ));
        for edit in &edits[start..end] {
            match *edit {
                Edit::Equal(i, _) => {
                    out.push(' ');
                    out.push_str(a[i]);
                }
                Edit::Delete(i) => {
                    out.push('-');
                    out.push_str(a[i]);
                }
                Edit::Insert(j) => {
                    out.push('+');
                    out.push_str(b[j]);
                }
            }
            out.push('\n');
        }
    }
    out
}

/// `start,len` with 1-based start; a single line omits the length and an
/// empty range points at the line before it.
fn format_range(start: usize, stop: usize) -> String {
    let len = stop - start;
    match len {
        1 => format!("{}", start + 1),
        0 => format!("{},0", start),
        _ => format!("{},{}", start + 1, len),
    }
}

fn shortest_edit(a: &[&str], b: &[&str]) -> Vec<Edit> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = (n + m) as usize;
    let offset = max as isize;
    let idx = |k: isize| (k + offset) as usize;

    let mut v = vec![0isize; 2 * max + 2];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'search: for d in 0..=(max as isize) {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let mut x = if k == -d || (k != d && v[idx(k - 1)] < v[idx(k + 1)]) {
                v[idx(k + 1)]
            } else {
                v[idx(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx(k)] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    let mut edits = Vec::new();
    let (mut x, mut y) = (n, m);
    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;
        let prev_k = if k == -d || (k != d && v[idx(k - 1)] < v[idx(k + 1)]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[idx(prev_k)];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            edits.push(Edit::Equal((x - 1) as usize, (y - 1) as usize));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                edits.push(Edit::Insert((y - 1) as usize));
            } else {
                edits.push(Edit::Delete((x - 1) as usize));
            }
        }
        x = prev_x;
        y = prev_y;
    }

    edits.reverse();
    edits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_inputs_give_empty_diff() {
        assert_eq!(unified_diff("a\nb\n", "a\nb\n", "x", "y", 3), "");
        assert_eq!(unified_diff("", "", "x", "y", 3), "");
    }

    #[test]
    fn test_single_line_change() {
        let old = "a\nb\nc\n";
        let new = "a\nB\nc\n";
        let diff = unified_diff(old, new, "old", "new", 3);
        assert_eq!(diff, "--- old\n+++ new\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n");
    }

    #[test]
    fn test_context_limits_hunk() {
        let old: String = (1..=10).map(|i| format!("{}\n", i)).collect();
        let new = old.replace("5\n", "five\n");
        let diff = unified_diff(&old, &new, "o", "n", 1);
        assert_eq!(diff, "--- o\n+++ n\n@@ -4,3 +4,3 @@\n 4\n-5\n+five\n 6\n");
    }

    #[test]
    fn test_distant_changes_make_separate_hunks() {
        let old: String = (1..=20).map(|i| format!("{}\n", i)).collect();
        let new: String = (1..=20)
            .map(|i| match i {
                2 => "two\n".to_string(),
                19 => "nineteen\n".to_string(),
                _ => format!("{}\n", i),
            })
            .collect();
        let diff = unified_diff(&old, &new, "o", "n", 1);
        assert_eq!(diff.matches("@@ -").count(), 2);
        assert!(diff.contains("@@ -1,3 +1,3 @@\n 1\n-2\n+two\n 3\n"));
        assert!(diff.contains("@@ -18,3 +18,3 @@\n 18\n-19\n+nineteen\n 20\n"));
    }

    #[test]
    fn test_insert_into_empty() {
        let diff = unified_diff("", "x\n", "o", "n", 3);
        assert_eq!(diff, "--- o\n+++ n\n@@ -0,0 +1 @@\n+x\n");
    }

    #[test]
    fn test_deletion_only() {
        let diff = unified_diff("a\nb\n", "a\n", "o", "n", 0);
        assert_eq!(diff, "--- o\n+++ n\n@@ -2 +1,0 @@\n-b\n");
    }
}
