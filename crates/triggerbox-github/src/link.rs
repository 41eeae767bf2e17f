//! `Link` header handling for paginated GitHub listings.

/// True when a `Link` header value advertises a `rel="next"` page.
///
/// ```text
/// <https://api.github.com/...&page=2>; rel="next", <...&page=5>; rel="last"
/// ```
pub fn has_next_page(link_header: Option<&str>) -> bool {
    let Some(header) = link_header else {
        return false;
    };
    header.split(',').any(|entry| {
        entry
            .split(';')
            .skip(1)
            .map(str::trim)
            .any(|param| param == r#"rel="next""# || param == "rel=next")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_is_detected_among_other_relations() {
        let header = r#"<https://api.github.com/repos/o/r/actions/runs?page=2>; rel="next", <https://api.github.com/repos/o/r/actions/runs?page=4>; rel="last""#;
        assert!(has_next_page(Some(header)));
    }

    #[test]
    fn last_page_has_no_next() {
        let header = r#"<https://api.github.com/x?page=1>; rel="first", <https://api.github.com/x?page=3>; rel="prev""#;
        assert!(!has_next_page(Some(header)));
        assert!(!has_next_page(None));
        assert!(!has_next_page(Some("")));
    }

    #[test]
    fn url_containing_next_is_not_a_relation() {
        let header = r#"<https://api.github.com/x?rel="next">; rel="prev""#;
        assert!(!has_next_page(Some(header)));
    }
}
