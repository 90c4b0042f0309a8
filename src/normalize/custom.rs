use std::collections::BTreeMap;

use crate::model::CustomValue;

fn parse_value(raw: &str) -> CustomValue {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CustomValue::Number(n),
        _ => CustomValue::Text(trimmed.to_string()),
    }
}

/// Custom property declarations (`--radius-sm: 4px`) become passthrough
/// tokens. Names nest on `.`, so `--radius.sm` becomes `{radius: {sm: ..}}`.
/// First declaration wins.
pub fn collect_custom_tokens<'a>(
    declarations: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> BTreeMap<String, CustomValue> {
    let mut root: BTreeMap<String, CustomValue> = BTreeMap::new();
    for (name, value) in declarations {
        let name = name.trim().trim_start_matches("--");
        let path: Vec<&str> = name.split('.').filter(|p| !p.is_empty()).collect();
        if path.is_empty() {
            continue;
        }
        insert(&mut root, &path, parse_value(value));
    }
    root
}

fn insert(map: &mut BTreeMap<String, CustomValue>, path: &[&str], value: CustomValue) {
    let (head, rest) = (path[0], &path[1..]);
    if rest.is_empty() {
        map.entry(head.to_string()).or_insert(value);
        return;
    }
    let slot = map
        .entry(head.to_string())
        .or_insert_with(|| CustomValue::Group(BTreeMap::new()));
    // a scalar already declared at this path keeps priority
    if let CustomValue::Group(children) = slot {
        insert(children, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nests_dotted_names() {
        let tokens = collect_custom_tokens([
            ("--radius.sm", "4px"),
            ("--radius.lg", "12px"),
            ("--opacity-muted", "0.6"),
            ("--radius.sm", "6px"),
        ]);
        let CustomValue::Group(radius) = &tokens["radius"] else {
            panic!("radius should be a group");
        };
        assert_eq!(radius["sm"], CustomValue::Text("4px".into()));
        assert_eq!(radius["lg"], CustomValue::Text("12px".into()));
        assert_eq!(tokens["opacity-muted"], CustomValue::Number(0.6));
    }

    #[test]
    fn scalar_blocks_nested_write() {
        let tokens = collect_custom_tokens([("--brand", "#123456"), ("--brand.dark", "#000")]);
        assert_eq!(tokens["brand"], CustomValue::Text("#123456".into()));
    }
}
