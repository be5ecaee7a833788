use speculate2::speculate;

speculate! {
    use std::sync::Arc;

    use axum::http::Uri;
    use feedback_core::{FeedbackStore, FeedbackSubmission, MemoryStore};
    use vega_feedback::api::extract_action;
    use vega_feedback::api::form::{parse_form, FormError, FORM_CONTENT_TYPE};
    use vega_feedback::StorageLatch;

    fn action_for(uri: &str) -> String {
        extract_action(&uri.parse::<Uri>().expect("valid test URI"))
    }

    describe "action extraction" {
        it "reads the action query parameter" {
            assert_eq!(action_for("/?action=feedback"), "feedback");
        }

        it "falls back to the path without its leading slash" {
            assert_eq!(action_for("/feedback"), "feedback");
        }

        it "returns an empty action for the root path" {
            assert_eq!(action_for("/"), "");
        }

        it "prefers the query parameter over the path" {
            assert_eq!(action_for("/somepath?action=feedback"), "feedback");
        }

        it "ignores an empty query parameter" {
            assert_eq!(action_for("/feedback?action="), "feedback");
        }

        it "uses the first action parameter when repeated" {
            assert_eq!(action_for("/?action=feedback&action=other"), "feedback");
        }

        it "percent-decodes the path" {
            assert_eq!(action_for("/feed%62ack"), "feedback");
        }

        it "keeps nested paths intact" {
            assert_eq!(action_for("/feedback/extra"), "feedback/extra");
        }
    }

    describe "form parsing" {
        it "maps same-named fields onto the submission" {
            let submission = parse_form(
                FORM_CONTENT_TYPE,
                b"helpfulness=good&docsQuality=ok&additionalFeedback=more+docs&email=a%40b.co&source=blog",
                None,
            )
            .unwrap();

            assert_eq!(submission.helpfulness, "good");
            assert_eq!(submission.docs_quality, "ok");
            assert_eq!(submission.additional_feedback, "more docs");
            assert_eq!(submission.email, "a@b.co");
            assert_eq!(submission.source, "blog");
        }

        it "joins repeated setup issues with a comma" {
            let submission = parse_form(
                FORM_CONTENT_TYPE,
                b"helpfulness=good&setupIssues=docker&setupIssues=oauth&setupIssues=ports",
                None,
            )
            .unwrap();

            assert_eq!(submission.setup_issues, "docker, oauth, ports");
        }

        it "defaults setup difficulty when absent or unparsable" {
            let absent = parse_form(FORM_CONTENT_TYPE, b"helpfulness=good", None).unwrap();
            assert_eq!(absent.setup_difficulty, 5);

            let junk = parse_form(FORM_CONTENT_TYPE, b"setupDifficulty=7.5", None).unwrap();
            assert_eq!(junk.setup_difficulty, 5);

            let given = parse_form(FORM_CONTENT_TYPE, b"setupDifficulty=2", None).unwrap();
            assert_eq!(given.setup_difficulty, 2);
        }

        it "takes the first value of single-valued fields" {
            let submission = parse_form(
                FORM_CONTENT_TYPE,
                b"helpfulness=first&helpfulness=second",
                None,
            )
            .unwrap();
            assert_eq!(submission.helpfulness, "first");
        }

        it "merges query fields after body fields" {
            let submission = parse_form(
                FORM_CONTENT_TYPE,
                b"helpfulness=body",
                Some("action=feedback&helpfulness=query&email=q%40example.com"),
            )
            .unwrap();

            assert_eq!(submission.helpfulness, "body");
            assert_eq!(submission.email, "q@example.com");
        }

        it "ignores the body for non-form content types" {
            let submission = parse_form("text/plain", b"helpfulness=good", None).unwrap();
            assert!(submission.helpfulness.is_empty());
        }

        it "rejects malformed percent escapes" {
            let err = parse_form(FORM_CONTENT_TYPE, b"helpfulness=100%", None).unwrap_err();
            assert_eq!(err, FormError::InvalidEscape(15));
        }

        it "rejects semicolon separators" {
            let err = parse_form(FORM_CONTENT_TYPE, b"helpfulness=good;email=x", None).unwrap_err();
            assert_eq!(err, FormError::Semicolon);
        }

        it "rejects fields that do not decode to UTF-8" {
            let err = parse_form(FORM_CONTENT_TYPE, b"helpfulness=good%FF", None).unwrap_err();
            assert_eq!(err, FormError::InvalidUtf8);
        }

        it "leaves source blank for the handler to default" {
            let submission = parse_form(FORM_CONTENT_TYPE, b"helpfulness=good", None).unwrap();
            assert!(submission.source.is_empty());
            assert_eq!(submission.with_default_source().source, "landing-page");
        }
    }

    describe "storage latch" {
        it "hands out the store it was built with" {
            let store = Arc::new(MemoryStore::new());
            let latch = StorageLatch::ready(store.clone());

            tokio_test::block_on(async {
                let shared = latch.get().await.expect("store should be ready");
                let feedback = FeedbackSubmission {
                    helpfulness: "good".into(),
                    ..Default::default()
                };
                shared.append_feedback(&feedback).await.unwrap();
            });

            assert_eq!(store.len(), 1);
        }

        it "reports no store once initialization has failed" {
            let latch = StorageLatch::new(|| async { None });
            assert!(!latch.is_initialized());

            let store = tokio_test::block_on(latch.get());
            assert!(store.is_none());
            assert!(latch.is_initialized());
        }
    }
}
