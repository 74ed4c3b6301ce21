//! Notion rules.

use synapse_kernel::{ExtractorSpec, RuleSetSpec, RuleSpec, ServiceId, Source, ValueKind};

use super::QUOTED;

/// Notion object id, dashed or compact.
const ID: &str = r"\b([0-9a-f]{8}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{12})\b";

const PAGE_ID: ExtractorSpec = ExtractorSpec {
    param: "page_id",
    sources: &[Source::Capture {
        patterns: &[
            r#"\bpage\s+(?:id\s+)?["']?([0-9a-f]{8}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{12})\b"#,
            ID,
        ],
        kind: ValueKind::Text,
    }],
    mandatory: true,
};

const DATABASE_ID: ExtractorSpec = ExtractorSpec {
    param: "database_id",
    sources: &[Source::Capture {
        patterns: &[
            r#"\b(?:database|db)\s+(?:id\s+)?["']?([0-9a-f]{8}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{12})\b"#,
            ID,
        ],
        kind: ValueKind::Text,
    }],
    mandatory: true,
};

const PARENT_PAGE_ID: ExtractorSpec = ExtractorSpec {
    param: "parent_page_id",
    sources: &[Source::Capture {
        patterns: &[
            r#"\b(?:under|in|parent|inside)\s+(?:(?:the\s+)?(?:parent\s+)?page\s+)?["']?([0-9a-f]{8}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{12})\b"#,
        ],
        kind: ValueKind::Text,
    }],
    mandatory: false,
};

const TITLE_STOPS: &[&str] = &[
    " with content",
    " with text",
    " with ",
    " content ",
    " under ",
    " in notion",
    " on notion",
    " in database",
    " in page",
    " parent",
];

/// Notion rule family.
pub static NOTION: RuleSetSpec = RuleSetSpec {
    service: ServiceId::Notion,
    vocabulary: &["notion"],
    rules: &[
        RuleSpec {
            name: "notion.append_blocks",
            operation: "append_blocks",
            trigger: r"\b(add|append|write)\b.*\b(content|text|blocks?|paragraph|to)\b",
            extractors: &[
                PAGE_ID,
                ExtractorSpec {
                    param: "content",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("content|text|saying"), QUOTED],
                        kind: ValueKind::Text,
                    }],
                    mandatory: true,
                },
            ],
        },
        // -- Databases -----------------------------------------------------
        RuleSpec {
            name: "notion.create_database",
            operation: "create_database",
            trigger: r"\b(create|new|make|add)\b.*\bdatabase\b",
            extractors: &[
                ExtractorSpec {
                    param: "title",
                    sources: &[
                        Source::Capture {
                            patterns: &[quoted_after!("called|named|titled|title")],
                            kind: ValueKind::Text,
                        },
                        Source::Clause {
                            markers: &[r"\b(?:called|named|titled)\b"],
                            stops: TITLE_STOPS,
                        },
                        Source::Capture {
                            patterns: &[QUOTED],
                            kind: ValueKind::Text,
                        },
                    ],
                    mandatory: false,
                },
                PARENT_PAGE_ID,
            ],
        },
        RuleSpec {
            name: "notion.query_database",
            operation: "query_database",
            trigger: r"\bquery\b.*\b(database|db)\b|\b(list|show|get)\b.*\b(entries|rows|items|records)\b",
            extractors: &[DATABASE_ID],
        },
        RuleSpec {
            name: "notion.get_database",
            operation: "get_database",
            trigger: r"\b(get|show|describe|open|view)\b.*\b(database|db)\b",
            extractors: &[DATABASE_ID],
        },
        // -- Blocks and pages ----------------------------------------------
        RuleSpec {
            name: "notion.get_blocks",
            operation: "get_blocks",
            trigger: r"\b(get|show|list|read|view)\b.*\b(blocks|content|contents)\b",
            extractors: &[PAGE_ID],
        },
        RuleSpec {
            name: "notion.delete_page",
            operation: "delete_page",
            trigger: r"\b(delete|remove|archive|trash)\b.*\bpage\b",
            extractors: &[PAGE_ID],
        },
        RuleSpec {
            name: "notion.update_page",
            operation: "update_page",
            trigger: r"\b(update|rename|edit|retitle)\b.*\bpage\b",
            extractors: &[
                PAGE_ID,
                ExtractorSpec {
                    param: "title",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("title|to|as"), QUOTED],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
            ],
        },
        RuleSpec {
            name: "notion.get_page",
            operation: "get_page",
            trigger: r"\b(get|show|open|read|fetch|view)\b.*\bpage\b",
            extractors: &[PAGE_ID],
        },
        RuleSpec {
            name: "notion.create_page",
            operation: "create_page",
            trigger: r"\b(create|new|add|make|write)\b.*\bpage\b",
            extractors: &[
                ExtractorSpec {
                    param: "title",
                    sources: &[
                        Source::Capture {
                            patterns: &[quoted_after!("called|named|titled|title")],
                            kind: ValueKind::Text,
                        },
                        Source::Clause {
                            markers: &[r"\b(?:called|named|titled)\b"],
                            stops: TITLE_STOPS,
                        },
                        Source::Capture {
                            patterns: &[QUOTED],
                            kind: ValueKind::Text,
                        },
                    ],
                    mandatory: true,
                },
                ExtractorSpec {
                    param: "content",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("content|text|saying|body")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
                PARENT_PAGE_ID,
                ExtractorSpec {
                    param: "parent_database_id",
                    sources: &[Source::Capture {
                        patterns: &[
                            r#"\b(?:in|to|into)\s+(?:the\s+)?database\s+["']?([0-9a-f]{8}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{12})\b"#,
                        ],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
            ],
        },
        // -- Search, status, listing ---------------------------------------
        RuleSpec {
            name: "notion.search",
            operation: "search",
            trigger: r"\bsearch\b|\bfind\b|\blook\s+for\b",
            extractors: &[ExtractorSpec {
                param: "query",
                sources: &[
                    Source::Capture {
                        patterns: &[quoted_after!("for"), QUOTED],
                        kind: ValueKind::Text,
                    },
                    Source::Clause {
                        markers: &[r"\bfor\b"],
                        stops: &[" in notion", " on notion", " from notion"],
                    },
                ],
                mandatory: false,
            }],
        },
        RuleSpec {
            name: "notion.status",
            operation: "status",
            trigger: r"\bnotion\b.*\b(status|connected|connection)\b|\b(check|status)\b.*\bnotion\b",
            extractors: &[],
        },
        RuleSpec {
            name: "notion.list_pages",
            operation: "list_pages",
            trigger: r"\b(list|show|get)\b.*\bpages\b|\bnotion\b.*\bpages\b|\bshow\b.*\bnotion\b",
            extractors: &[PARENT_PAGE_ID],
        },
    ],
};
