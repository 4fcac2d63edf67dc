use crate::parse_rules_yaml;
use anyhow::Context;
use camino::Utf8Path;
use otmguard_domain::rule::Rule;
use walkdir::WalkDir;

/// Load every `*.yaml`/`*.yml` rule file under `dir`, concatenating rules
/// in (lexicographic file order, then document order within each file).
///
/// Sorting is what makes loading deterministic across platforms and
/// directory-iteration orders; the resulting rule order is the engine's
/// finding order.
pub fn load_rules_from_dir(dir: &Utf8Path) -> anyhow::Result<Vec<Rule>> {
    let mut rules = Vec::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yaml" || e == "yml");
        if !is_yaml {
            continue;
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read rule file {}", path.display()))?;
        let parsed = parse_rules_yaml(&text)
            .with_context(|| format!("parse rule file {}", path.display()))?;
        rules.extend(parsed);
    }

    Ok(rules)
}
