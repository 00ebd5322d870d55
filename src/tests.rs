#[cfg(test)]
mod tests {

    mod slug_tests {
        use crate::services::slug::{generate_slug, is_salted_from};

        const FORBIDDEN: &str = "*+~.()'\"!:|@$,?^/#&=%{}[]<>\\;_`";

        #[test]
        fn test_generate_slug_basic() {
            assert_eq!(generate_slug("Hello World", false), "hello-world");
        }

        #[test]
        fn test_generate_slug_special_characters() {
            assert_eq!(generate_slug("Hello, World!", false), "hello-world");
        }

        #[test]
        fn test_generate_slug_numbers() {
            assert_eq!(generate_slug("Article 123", false), "article-123");
        }

        #[test]
        fn test_generate_slug_multiple_spaces() {
            assert_eq!(generate_slug("  Hello   World  ", false), "hello-world");
        }

        #[test]
        fn test_generate_slug_strips_rather_than_hyphenates_punctuation() {
            assert_eq!(generate_slug("node.js", false), "nodejs");
            assert_eq!(generate_slug("snake_case title", false), "snakecase-title");
            assert_eq!(generate_slug("C++ & Rust", false), "c-rust");
        }

        #[test]
        fn test_generate_slug_only_punctuation_is_empty() {
            assert_eq!(generate_slug("?!...", false), "");
            assert_eq!(generate_slug("   ", false), "");
        }

        #[test]
        fn test_generate_slug_non_latin_keeps_script() {
            assert_eq!(generate_slug("Привет Мир", false), "привет-мир");
            assert_eq!(generate_slug("বাংলা ব্লগ", false), "বাংলা-ব্লগ");
        }

        #[test]
        fn test_generate_slug_non_latin_accents() {
            assert_eq!(generate_slug("Café au lait!", false), "café-au-lait");
        }

        #[test]
        fn test_generate_slug_non_latin_does_not_collapse_hyphens() {
            assert_eq!(generate_slug("Привет - Мир", false), "привет---мир");
        }

        #[test]
        fn test_generate_slug_non_latin_trims_one_trailing_hyphen() {
            assert_eq!(generate_slug("Привет -", false), "привет-");
            assert_eq!(generate_slug("Привет !", false), "привет");
        }

        #[test]
        fn test_generate_slug_salted_shape() {
            let slug = generate_slug("Hello, World!", true);
            assert!(is_salted_from(&slug, "hello-world"), "unexpected slug {}", slug);
            assert_eq!(slug.len(), "hello-world".len() + 8);
        }

        #[test]
        fn test_generate_slug_salted_differs() {
            let a = generate_slug("Same Title", true);
            let b = generate_slug("Same Title", true);
            assert_ne!(a, b);
        }

        #[test]
        fn test_generate_slug_ascii_properties() {
            let titles = [
                "Hello, World!",
                "-leading and trailing-",
                "Mixed CASE with   gaps",
                "a/b\\c [d] {e} <f> (g)",
                "100% pure; \"quoted\" 'text'",
                "Rust 2024: what's new?",
                "email@example.com | pipes ^ carets",
            ];
            for title in titles {
                let slug = generate_slug(title, false);
                assert!(
                    !slug.chars().any(|c| FORBIDDEN.contains(c)),
                    "{} -> {}",
                    title,
                    slug
                );
                assert!(!slug.starts_with('-') && !slug.ends_with('-'), "{} -> {}", title, slug);
                assert_eq!(generate_slug(&slug, false), slug, "not idempotent for {}", title);
            }
        }

        #[test]
        fn test_is_salted_from() {
            assert!(is_salted_from("post-abc1234", "post"));
            assert!(!is_salted_from("post-ABC1234", "post"));
            assert!(!is_salted_from("post-abc123", "post"));
            assert!(!is_salted_from("other-abc1234", "post"));
        }
    }

    mod model_tests {
        use crate::models::{split_tags, ImageUpload, Pagination, PostState, UpsertPost};

        #[test]
        fn test_post_state_parse_and_display() {
            assert_eq!("Published".parse::<PostState>(), Ok(PostState::Published));
            assert_eq!(" draft ".parse::<PostState>(), Ok(PostState::Draft));
            assert_eq!("archived".parse::<PostState>(), Ok(PostState::Archived));
            assert!("deleted".parse::<PostState>().is_err());
            assert_eq!(PostState::default().to_string(), "draft");
        }

        #[test]
        fn test_split_tags() {
            assert_eq!(split_tags(" rust, web ,, axum "), vec!["rust", "web", "axum"]);
            assert!(split_tags(" , ").is_empty());
        }

        #[test]
        fn test_upsert_normalized_drops_blank_fields() {
            let input = UpsertPost {
                title: Some("  Title  ".to_string()),
                content: Some("   ".to_string()),
                state: Some(String::new()),
                tags: Some(vec![" ".to_string()]),
                feature_image: Some(ImageUpload {
                    file_name: "empty.png".to_string(),
                    data: Vec::new(),
                }),
                ..Default::default()
            }
            .normalized();

            assert_eq!(input.title.as_deref(), Some("Title"));
            assert!(input.content.is_none());
            assert!(input.state.is_none());
            assert!(input.tags.is_none());
            assert!(input.feature_image.is_none());
        }

        #[test]
        fn test_pagination_metadata() {
            let p = Pagination::new(1, 10, 0);
            assert_eq!(p.total_pages, 0);
            assert!(!p.has_next_page);
            assert!(!p.has_previous_page);

            let p = Pagination::new(2, 10, 25);
            assert_eq!(p.total_pages, 3);
            assert!(p.has_next_page);
            assert!(p.has_previous_page);

            let p = Pagination::new(3, 10, 25);
            assert!(!p.has_next_page);
        }

        #[test]
        fn test_pagination_serializes_camel_case() {
            let json = serde_json::to_value(Pagination::new(1, 10, 11)).unwrap();
            assert_eq!(json["currentPage"], 1);
            assert_eq!(json["totalPages"], 2);
            assert_eq!(json["totalCount"], 11);
            assert_eq!(json["hasNextPage"], true);
            assert_eq!(json["hasPreviousPage"], false);
        }
    }

    mod listing_tests {
        use crate::services::listing::{build_filter, ListQuery, PageRequest};
        use crate::services::ServiceError;

        #[test]
        fn test_page_request_clamps() {
            let p = PageRequest::new(Some(0), Some(200), 10, 100);
            assert_eq!(p.page, 1);
            assert_eq!(p.limit, 100);
            assert_eq!(p.offset(), 0);

            let p = PageRequest::new(None, Some(0), 10, 100);
            assert_eq!(p.limit, 1);

            let p = PageRequest::new(Some(3), None, 10, 100);
            assert_eq!(p.limit, 10);
            assert_eq!(p.offset(), 20);

            let p = PageRequest::new(Some(-1), Some(-5), 10, 100);
            assert_eq!(p.page, 1);
            assert_eq!(p.limit, 1);
        }

        #[test]
        fn test_page_request_offset_saturates() {
            let p = PageRequest::new(Some(i64::MAX), Some(100), 10, 100);
            assert_eq!(p.offset(), i64::MAX);
        }

        #[test]
        fn test_list_query_parses_page_numbers_leniently() {
            let query: ListQuery =
                serde_json::from_value(serde_json::json!({ "page": "-1", "limit": "abc" })).unwrap();
            assert_eq!(query.page, Some(-1));
            assert_eq!(query.limit, None);

            let query: ListQuery =
                serde_json::from_value(serde_json::json!({ "page": "18446744073709551615" })).unwrap();
            assert_eq!(query.page, Some(i64::MAX));
        }

        #[test]
        fn test_filter_lowercases_search_terms() {
            let query = ListQuery {
                search_text: Some("ПРИВЕТ".to_string()),
                tags: Some("Ünïcode".to_string()),
                ..Default::default()
            };
            let filter = build_filter(&query).unwrap();
            assert_eq!(filter.params, vec!["%привет%", "%ünïcode%", "published"]);
        }

        #[test]
        fn test_filter_defaults_to_published() {
            let filter = build_filter(&ListQuery::default()).unwrap();
            assert_eq!(filter.clause, "state = ?");
            assert_eq!(filter.params, vec!["published"]);
        }

        #[test]
        fn test_filter_one_predicate_per_tag() {
            let query = ListQuery {
                tags: Some("rust, ,web".to_string()),
                state: Some("draft".to_string()),
                ..Default::default()
            };
            let filter = build_filter(&query).unwrap();
            assert_eq!(filter.clause.matches("EXISTS").count(), 2);
            assert_eq!(filter.params, vec!["%rust%", "%web%", "draft"]);
        }

        #[test]
        fn test_filter_escapes_like_wildcards() {
            let query = ListQuery {
                search_text: Some("100%_done".to_string()),
                ..Default::default()
            };
            let filter = build_filter(&query).unwrap();
            assert!(filter.clause.starts_with("unicode_lower(title) LIKE ?"));
            assert_eq!(filter.params[0], "%100\\%\\_done%");
        }

        #[test]
        fn test_filter_rejects_unknown_state() {
            let query = ListQuery {
                state: Some("deleted".to_string()),
                ..Default::default()
            };
            assert!(matches!(
                build_filter(&query),
                Err(ServiceError::BadRequest(_))
            ));
        }
    }
}
