use super::rules::CompiledRules;

/// Strip all rule violations from `text`.
///
/// Stripping one rule can expose a match for another (removing a hashtag
/// may join two fragments into a CTA phrase), so passes repeat until the
/// text validates. Each pass removes at least one byte whenever a
/// violation exists, so the loop terminates.
pub(super) fn sanitize(rules: &CompiledRules, text: &str) -> String {
    let mut current = collapse_whitespace(text);
    loop {
        if rules.violations(&current).is_empty() {
            return current;
        }
        let next = strip_pass(rules, &current);
        if next == current {
            // Unreachable with the current rule set; degrade to empty
            // rather than spin.
            return String::new();
        }
        current = next;
    }
}

fn strip_pass(rules: &CompiledRules, text: &str) -> String {
    let stripped = rules.hashtag.replace_all(text, "");
    let stripped = rules.cta.replace_all(&stripped, "");
    let stripped = rules.collective.replace_all(&stripped, "");
    let stripped = rules.support_mention.replace_all(&stripped, "");
    let stripped = rules.closing_line.replace_all(&stripped, "");
    let stripped = rules.signature_line.replace_all(&stripped, "");
    collapse_whitespace(&stripped)
}

/// Collapse horizontal whitespace runs, trim lines, and squeeze blank-line
/// runs down to a single separator. Idempotent.
pub(super) fn collapse_whitespace(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut blank_pending = false;

    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank_pending = !out.is_empty();
        } else {
            if blank_pending {
                out.push(String::new());
                blank_pending = false;
            }
            out.push(collapsed);
        }
    }

    out.join("\n")
}
