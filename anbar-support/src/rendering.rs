//! Text rendering for diagnostics.
//!
//! Dependency paths, short type names and "did you mean?" hints used by
//! the container's error messages.

/// Joins the hops of a dependency path with arrows.
///
/// # Examples
/// ```
/// use anbar_support::rendering::render_chain;
///
/// let path = ["Service", "dyn Greeter(Console)", "Service"];
/// assert_eq!(render_chain(&path), "Service → dyn Greeter(Console) → Service");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    let hops: Vec<&str> = chain.iter().map(AsRef::as_ref).collect();
    hops.join(" → ")
}

/// One line per consecutive pair of hops.
///
/// ```text
/// [Service] relies on [dyn Greeter(Console)]
/// [dyn Greeter(Console)] relies on [Service]
/// ```
pub fn render_reliance(chain: &[impl AsRef<str>]) -> String {
    chain
        .windows(2)
        .map(|pair| format!("[{}] relies on [{}]\n", pair[0].as_ref(), pair[1].as_ref()))
        .collect()
}

/// Strips module paths from every path inside a type name.
///
/// ```
/// use anbar_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("my_app::services::UserService"), "UserService");
/// assert_eq!(
///     shorten_type_name("alloc::boxed::Box<dyn my_app::traits::Greeter>"),
///     "Box<dyn Greeter>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let is_delimiter =
        |c: char| matches!(c, '<' | '>' | ',' | ' ' | '(' | ')' | '&' | '[' | ']' | ';');

    let mut short = String::with_capacity(full_name.len());
    let mut rest = full_name;
    while let Some(pos) = rest.find(is_delimiter) {
        short.push_str(last_segment(&rest[..pos]));
        // Delimiters are all one byte wide.
        short.push_str(&rest[pos..=pos]);
        rest = &rest[pos + 1..];
    }
    short.push_str(last_segment(rest));
    short
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Names from `available` that look like a typo of `requested`, closest
/// first.
///
/// Names are compared without module paths and without case. A name that
/// contains the other one always matches; otherwise the edit distance must
/// stay within a third of the requested name (at least 2).
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let wanted = shorten_type_name(requested).to_lowercase();
    let threshold = (wanted.chars().count() / 3).max(2);

    let mut scored: Vec<(usize, &str)> = available
        .iter()
        .copied()
        .filter(|&name| name != requested)
        .filter_map(|name| {
            let candidate = shorten_type_name(name).to_lowercase();
            if candidate.contains(&wanted) || wanted.contains(&candidate) {
                return Some((0, name));
            }
            let distance = edit_distance(&wanted, &candidate);
            (distance <= threshold).then_some((distance, name))
        })
        .collect();

    scored.sort_unstable();
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Levenshtein distance over chars, one row at a time.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == *cb {
                diagonal
            } else {
                1 + diagonal.min(above).min(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_of_components_and_interfaces() {
        let path = ["Hive", "dyn Bee(Worker)", "Hive"];
        assert_eq!(render_chain(&path), "Hive → dyn Bee(Worker) → Hive");
        let empty: [&str; 0] = [];
        assert_eq!(render_chain(&empty), "");
    }

    #[test]
    fn reliance_lists_each_hop() {
        let path = ["A", "dyn Greeter(B)", "A"];
        assert_eq!(
            render_reliance(&path),
            "[A] relies on [dyn Greeter(B)]\n[dyn Greeter(B)] relies on [A]\n"
        );
        assert_eq!(render_reliance(&["A"]), "");
    }

    #[test]
    fn shortens_nested_paths() {
        assert_eq!(shorten_type_name("String"), "String");
        assert_eq!(shorten_type_name("dyn injection::Named"), "dyn Named");
        assert_eq!(
            shorten_type_name("alloc::boxed::Box<alloc::boxed::Box<app::Config>>"),
            "Box<Box<Config>>"
        );
        assert_eq!(
            shorten_type_name("core::result::Result<app::Port, app::NoPort>"),
            "Result<Port, NoPort>"
        );
        assert_eq!(shorten_type_name("&[app::Item; 3]"), "&[Item; 3]");
    }

    #[test]
    fn edit_distance_counts_single_edits() {
        assert_eq!(edit_distance("database", "database"), 0);
        assert_eq!(edit_distance("databse", "database"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn suggests_typos_closest_first() {
        let available = [
            "app::UserService",
            "app::UserRepository",
            "app::Logger",
            "app::Database",
        ];

        let suggestions = suggest_similar("app::UserServise", &available, 3);
        assert_eq!(suggestions[0], "app::UserService");
        assert!(!suggestions.contains(&"app::Logger".to_string()));

        assert_eq!(suggest_similar("app::Databse", &available, 3), vec!["app::Database"]);
    }

    #[test]
    fn substring_matches_and_limits() {
        let available = ["app::Repo", "app::UserRepo", "app::OrderRepo"];
        let suggestions = suggest_similar("other::Repo", &available, 2);
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0], "app::OrderRepo");
    }

    #[test]
    fn never_suggests_the_request_itself() {
        let available = ["app::Cache"];
        assert!(suggest_similar("app::Cache", &available, 3).is_empty());
        assert!(suggest_similar("app::Mailer", &available, 3).is_empty());
    }
}
