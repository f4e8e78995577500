use crate::panel::{PanelId, SelectRule};

const HEADER_TOKEN: &str = "NAME";
const EMPTY_LISTING: &str = "no resources found";
/// Single upper-case tokens up to this length are treated as group titles.
const BARE_TOKEN_MAX: usize = 8;

/// Line index 0 holds a header or group title and never carries the selection.
pub const FIRST_SELECTABLE_LINE: usize = 1;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Selection {
    pub panel: PanelId,
    pub line: usize,
}

pub fn is_selectable(rule: SelectRule, lines: &[&str], index: usize) -> bool {
    let Some(line) = lines.get(index) else {
        return false;
    };
    let line = line.trim();
    if line.is_empty() || line.to_uppercase() == line {
        return false;
    }

    let fields = line.split_whitespace().collect::<Vec<_>>();
    let Some(first) = fields.first() else {
        return false;
    };
    if fields.join(" ").to_lowercase().contains(EMPTY_LISTING) {
        return false;
    }
    if *first == HEADER_TOKEN {
        return false;
    }
    if fields.len() == 1 && first.len() <= BARE_TOKEN_MAX && first.to_uppercase() == *first {
        return false;
    }

    match rule {
        SelectRule::Tabular => fields.len() >= 2,
        SelectRule::Digest => true,
    }
}

/// Searches from `start` stepping by `delta`. With `wrap` the walk visits
/// every line once, wrapping at both ends; without it the walk stops at
/// the first out-of-range index.
pub fn find_selectable(
    rule: SelectRule,
    lines: &[&str],
    start: isize,
    delta: isize,
    wrap: bool,
) -> Option<usize> {
    if lines.is_empty() || delta == 0 {
        return None;
    }
    let len = lines.len() as isize;

    if wrap {
        let mut index = start;
        for _ in 0..lines.len() {
            if index < 0 {
                index = len - 1;
            }
            if index >= len {
                index = 0;
            }
            if is_selectable(rule, lines, index as usize) {
                return Some(index as usize);
            }
            index += delta;
        }
        return None;
    }

    let mut index = start;
    while (0..len).contains(&index) {
        if is_selectable(rule, lines, index as usize) {
            return Some(index as usize);
        }
        index += delta;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{find_selectable, is_selectable};
    use crate::panel::SelectRule;

    fn tabular(line: &str) -> bool {
        is_selectable(SelectRule::Tabular, &[line], 0)
    }

    #[test]
    fn header_and_heading_lines_are_rejected() {
        assert!(!tabular("NAME READY STATUS"));
        assert!(!tabular("NAMESPACE NAME READY STATUS"));
        assert!(!tabular("DEPLOY"));
        assert!(!tabular("SERVICEACCOUNTS"));
        assert!(!tabular("   "));
        assert!(!tabular("No resources found in default namespace."));
    }

    #[test]
    fn resource_rows_are_selectable() {
        assert!(tabular("nginx-7d 1/1 Running"));
        assert!(tabular("kube-system coredns-abc 1/1 Running 0 3d"));
    }

    #[test]
    fn tabular_rows_need_two_fields_but_digest_lines_do_not() {
        assert!(!tabular("nginx"));
        assert!(is_selectable(SelectRule::Digest, &["nginx"], 0));
        assert!(!is_selectable(SelectRule::Digest, &["PODS"], 0));
    }

    #[test]
    fn out_of_range_index_is_not_selectable() {
        assert!(!is_selectable(SelectRule::Tabular, &["a b"], 3));
    }

    #[test]
    fn forward_search_without_wrap_stops_at_end() {
        let lines = ["DEPLOY", "NAME READY", "web 1/1", "api 1/1", "RS"];
        assert_eq!(
            find_selectable(SelectRule::Tabular, &lines, 3, 1, false),
            Some(3)
        );
        assert_eq!(find_selectable(SelectRule::Tabular, &lines, 4, 1, false), None);
        assert_eq!(
            find_selectable(SelectRule::Tabular, &lines, 1, -1, false),
            None
        );
    }

    #[test]
    fn wrapping_search_comes_around_to_the_top() {
        let lines = ["PODS", "web 1/1", "", "NAME READY"];
        assert_eq!(find_selectable(SelectRule::Tabular, &lines, 2, 1, true), Some(1));
        assert_eq!(find_selectable(SelectRule::Tabular, &lines, -1, 1, true), Some(1));
    }

    #[test]
    fn search_on_unselectable_text_finds_nothing() {
        let lines = ["PODS", "NAME READY", ""];
        assert_eq!(find_selectable(SelectRule::Tabular, &lines, 1, 1, true), None);
        assert_eq!(find_selectable(SelectRule::Tabular, &[], 0, 1, true), None);
    }
}
