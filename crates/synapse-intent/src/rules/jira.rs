//! Jira rules.

use synapse_kernel::{ExtractorSpec, RuleSetSpec, RuleSpec, ServiceId, Source, ValueKind};

use super::QUOTED;

const ISSUE_KEY: ExtractorSpec = ExtractorSpec {
    param: "issue_key",
    sources: &[Source::Capture {
        patterns: &[r"\b([a-z][a-z0-9_]+-\d+)\b"],
        kind: ValueKind::Upper,
    }],
    mandatory: true,
};

const PROJECT_PATTERNS: &[&str] = &[
    r#"\bproject\s+(?:key\s+)?["']?([a-z][a-z0-9_]+)\b"#,
    r"\b(?:in|for)\s+(?:the\s+)?([a-z][a-z0-9_]+)\s+project\b",
];

const PROJECT_KEY: ExtractorSpec = ExtractorSpec {
    param: "project_key",
    sources: &[Source::Capture {
        patterns: PROJECT_PATTERNS,
        kind: ValueKind::Upper,
    }],
    mandatory: true,
};

const OPTIONAL_PROJECT_KEY: ExtractorSpec = ExtractorSpec {
    param: "project_key",
    sources: &[Source::Capture {
        patterns: PROJECT_PATTERNS,
        kind: ValueKind::Upper,
    }],
    mandatory: false,
};

const STATUS_FILTER: ExtractorSpec = ExtractorSpec {
    param: "status",
    sources: &[Source::Choice {
        options: &[
            ("to do", "To Do"),
            ("todo", "To Do"),
            ("in progress", "In Progress"),
            ("in review", "In Review"),
            ("done", "Done"),
        ],
        otherwise: None,
    }],
    mandatory: false,
};

/// Jira rule family.
pub static JIRA: RuleSetSpec = RuleSetSpec {
    service: ServiceId::Jira,
    vocabulary: &["jira"],
    rules: &[
        RuleSpec {
            name: "jira.add_comment",
            operation: "add_comment",
            trigger: r"\bcomment\b",
            extractors: &[
                ISSUE_KEY,
                ExtractorSpec {
                    param: "comment",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("comment|saying|with"), QUOTED],
                        kind: ValueKind::Text,
                    }],
                    mandatory: true,
                },
            ],
        },
        RuleSpec {
            name: "jira.assign_issue",
            operation: "assign_issue",
            trigger: r"\bassign\b",
            extractors: &[
                ISSUE_KEY,
                ExtractorSpec {
                    param: "assignee",
                    sources: &[Source::Capture {
                        patterns: &[r#"\bto\s+["']?([\w.+-]+@[\w-]+(?:\.[\w-]+)+|[\w.-]*\w)"#],
                        kind: ValueKind::Text,
                    }],
                    mandatory: true,
                },
            ],
        },
        // -- Search --------------------------------------------------------
        RuleSpec {
            name: "jira.search_jql",
            operation: "search_issues",
            trigger: r"\bjql\b",
            extractors: &[ExtractorSpec {
                param: "jql",
                sources: &[
                    Source::Capture {
                        patterns: &[QUOTED],
                        kind: ValueKind::Text,
                    },
                    Source::Clause {
                        markers: &[r"\bjql\b:?"],
                        stops: &[],
                    },
                ],
                mandatory: true,
            }],
        },
        RuleSpec {
            name: "jira.search_text",
            operation: "search_issues",
            trigger: r"\b(search|find|look\s+for)\b",
            extractors: &[
                ExtractorSpec {
                    param: "query",
                    sources: &[
                        Source::Capture {
                            patterns: &[quoted_after!("for"), QUOTED],
                            kind: ValueKind::Text,
                        },
                        Source::Clause {
                            markers: &[r"\bfor\b"],
                            stops: &[" in jira", " on jira", " in project", " in the "],
                        },
                    ],
                    mandatory: true,
                },
                OPTIONAL_PROJECT_KEY,
            ],
        },
        // -- Issues --------------------------------------------------------
        RuleSpec {
            name: "jira.list_issues",
            operation: "list_issues",
            trigger: r"\b(list|show|get|view|find|search)\b.*\b(issues|tickets|bugs|tasks|stories)\b|\bmy\b.*\b(issues|tickets)\b",
            extractors: &[
                OPTIONAL_PROJECT_KEY,
                STATUS_FILTER,
                ExtractorSpec {
                    param: "max_results",
                    sources: &[Source::Capture {
                        patterns: &[r"\b(?:last|latest|recent|top|first)\s+(\d+)\b"],
                        kind: ValueKind::Integer,
                    }],
                    mandatory: false,
                },
            ],
        },
        RuleSpec {
            name: "jira.create_issue",
            operation: "create_issue",
            trigger: r"\b(create|new|add|file|open|make|raise)\b.*\b(issue|ticket|bug|task|story|epic)\b",
            extractors: &[
                PROJECT_KEY,
                ExtractorSpec {
                    param: "summary",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("summary|titled|title|called|named"), QUOTED],
                        kind: ValueKind::Text,
                    }],
                    mandatory: true,
                },
                ExtractorSpec {
                    param: "description",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("description|body|details")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "issue_type",
                    sources: &[Source::Choice {
                        options: &[
                            ("bug", "Bug"),
                            ("story", "Story"),
                            ("epic", "Epic"),
                            ("task", "Task"),
                        ],
                        otherwise: None,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "priority",
                    sources: &[Source::Capture {
                        patterns: &[
                            r"\bpriority\s+(?:is\s+|of\s+)?(highest|high|medium|lowest|low)\b",
                            r"\b(highest|high|medium|lowest|low)\s+priority\b",
                        ],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
            ],
        },
        RuleSpec {
            name: "jira.delete_issue",
            operation: "delete_issue",
            trigger: r"\b(delete|remove)\b",
            extractors: &[ISSUE_KEY],
        },
        RuleSpec {
            name: "jira.update_issue",
            operation: "update_issue",
            trigger: r"\b(update|edit|change|move|transition|set|mark)\b",
            extractors: &[
                ISSUE_KEY,
                ExtractorSpec {
                    param: "summary",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("summary|title")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "description",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("description")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "status",
                    sources: &[
                        Source::Capture {
                            patterns: &[quoted_after!("status")],
                            kind: ValueKind::Text,
                        },
                        Source::Choice {
                            options: &[
                                ("to do", "To Do"),
                                ("todo", "To Do"),
                                ("in progress", "In Progress"),
                                ("in review", "In Review"),
                                ("done", "Done"),
                            ],
                            otherwise: None,
                        },
                    ],
                    mandatory: false,
                },
            ],
        },
        RuleSpec {
            name: "jira.get_issue",
            operation: "get_issue",
            trigger: r"\b(get|show|view|open|fetch|details?|describe|what)\b",
            extractors: &[ISSUE_KEY],
        },
        // -- Projects and status -------------------------------------------
        RuleSpec {
            name: "jira.list_projects",
            operation: "list_projects",
            trigger: r"\b(list|show|get|all)\b.*\bprojects\b|\bmy projects\b",
            extractors: &[],
        },
        RuleSpec {
            name: "jira.get_project",
            operation: "get_project",
            trigger: r"\bproject\b",
            extractors: &[PROJECT_KEY],
        },
        RuleSpec {
            name: "jira.status",
            operation: "status",
            trigger: r"\bjira\b.*\b(status|connected|connection)\b|\b(check|status)\b.*\bjira\b",
            extractors: &[],
        },
    ],
};
