//! Slack rules.

use synapse_kernel::{ExtractorSpec, RuleSetSpec, RuleSpec, ServiceId, Source, ValueKind};

use super::QUOTED;

const CHANNEL_PATTERNS: &[&str] = &[
    r"(?:^|\s)#([\w-]+)",
    r#"\bchannel\s+["']?#?([\w-]+)"#,
];

const CHANNEL: ExtractorSpec = ExtractorSpec {
    param: "channel",
    sources: &[Source::Capture {
        patterns: CHANNEL_PATTERNS,
        kind: ValueKind::Text,
    }],
    mandatory: true,
};

const TS: ExtractorSpec = ExtractorSpec {
    param: "ts",
    sources: &[Source::Capture {
        patterns: &[r"\b(\d{10}\.\d{6})\b"],
        kind: ValueKind::Text,
    }],
    mandatory: true,
};

const TEXT_STOPS: &[&str] = &[
    " to #",
    " in #",
    " on #",
    " to channel",
    " in channel",
    " on slack",
    " to slack",
    " in slack",
    " via slack",
];

/// Slack rule family.
pub static SLACK: RuleSetSpec = RuleSetSpec {
    service: ServiceId::Slack,
    vocabulary: &["slack"],
    rules: &[
        // -- Messages ------------------------------------------------------
        RuleSpec {
            name: "slack.list_messages",
            operation: "list_messages",
            trigger: r"\b(list|show|get|read|fetch|view)\b.*\bmessages\b|\bhistory\b",
            extractors: &[
                CHANNEL,
                ExtractorSpec {
                    param: "limit",
                    sources: &[Source::Capture {
                        patterns: &[r"\b(?:last|latest|recent|top|first)\s+(\d+)\b"],
                        kind: ValueKind::Integer,
                    }],
                    mandatory: false,
                },
            ],
        },
        RuleSpec {
            name: "slack.update_message",
            operation: "update_message",
            trigger: r"\b(update|edit|change)\b.*\bmessage\b",
            extractors: &[
                CHANNEL,
                TS,
                ExtractorSpec {
                    param: "text",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("to|text|with|saying"), QUOTED],
                        kind: ValueKind::Text,
                    }],
                    mandatory: true,
                },
            ],
        },
        RuleSpec {
            name: "slack.delete_message",
            operation: "delete_message",
            trigger: r"\b(delete|remove)\b.*\bmessage\b",
            extractors: &[CHANNEL, TS],
        },
        RuleSpec {
            name: "slack.upload_file",
            operation: "upload_file",
            trigger: r"\b(upload|share|attach)\b",
            extractors: &[
                CHANNEL,
                ExtractorSpec {
                    param: "file_path",
                    sources: &[Source::Capture {
                        patterns: &[
                            r#"\b(?:file|upload|share|attach)\s+["']?((?:[~.]?/)?[\w./-]*\.\w+)"#,
                        ],
                        kind: ValueKind::Text,
                    }],
                    mandatory: true,
                },
                ExtractorSpec {
                    param: "title",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("title|titled|called")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "comment",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("comment|saying|message")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
            ],
        },
        RuleSpec {
            name: "slack.send_message",
            operation: "send_message",
            trigger: r"\b(send|post|say|message|tell|write|notify)\b",
            extractors: &[
                CHANNEL,
                ExtractorSpec {
                    param: "text",
                    sources: &[
                        Source::Capture {
                            patterns: &[quoted_after!("saying|message|text|say"), QUOTED],
                            kind: ValueKind::Text,
                        },
                        Source::Clause {
                            markers: &[
                                r"\bsaying\b",
                                r"\bmessage\b",
                                r"\bsay\b",
                                r"#[\w-]+\s*:",
                                r"\b(?:tell|notify)\s+#[\w-]+(?:\s+on\s+slack)?(?:\s+that)?\b",
                                r"\b(?:send|post)\b(?:\s+(?:a\s+)?message\b)?",
                            ],
                            stops: TEXT_STOPS,
                        },
                    ],
                    mandatory: true,
                },
                ExtractorSpec {
                    param: "thread_ts",
                    sources: &[Source::Capture {
                        patterns: &[r"\bthread\s+(\d{10}\.\d{6})\b"],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
            ],
        },
        // -- Channels ------------------------------------------------------
        RuleSpec {
            name: "slack.create_channel",
            operation: "create_channel",
            trigger: r"\b(create|new|make|add)\b.*\bchannel\b",
            extractors: &[
                ExtractorSpec {
                    param: "name",
                    sources: &[Source::Capture {
                        patterns: &[
                            r#"\b(?:called|named)\s+["']?#?([\w-]+)"#,
                            r#"\bchannel\s+["']?#?([\w-]+)"#,
                            r"(?:^|\s)#([\w-]+)",
                        ],
                        kind: ValueKind::Text,
                    }],
                    mandatory: true,
                },
                ExtractorSpec {
                    param: "is_private",
                    sources: &[Source::Flag {
                        keywords: &["private"],
                    }],
                    mandatory: false,
                },
            ],
        },
        RuleSpec {
            name: "slack.join_channel",
            operation: "join_channel",
            trigger: r"\bjoin\b",
            extractors: &[ExtractorSpec {
                param: "channel_name",
                sources: &[Source::Capture {
                    patterns: CHANNEL_PATTERNS,
                    kind: ValueKind::Text,
                }],
                mandatory: true,
            }],
        },
        RuleSpec {
            name: "slack.list_channels",
            operation: "list_channels",
            trigger: r"\bchannels\b",
            extractors: &[],
        },
        // -- Users and status ----------------------------------------------
        RuleSpec {
            name: "slack.user_by_email",
            operation: "get_user_info",
            trigger: r"\b(user|who|info|profile|lookup|look up|find)\b",
            extractors: &[ExtractorSpec {
                param: "email",
                sources: &[Source::Capture {
                    patterns: &[r"([\w.+-]+@[\w-]+(?:\.[\w-]+)+)"],
                    kind: ValueKind::Text,
                }],
                mandatory: true,
            }],
        },
        RuleSpec {
            name: "slack.user_by_id",
            operation: "get_user_info",
            trigger: r"\b(user|who|info|profile|lookup|look up|find)\b",
            extractors: &[ExtractorSpec {
                param: "user_id",
                sources: &[Source::Capture {
                    patterns: &[r"(?-i)\b([UW][A-Z0-9]{8,})\b"],
                    kind: ValueKind::Text,
                }],
                mandatory: true,
            }],
        },
        RuleSpec {
            name: "slack.list_users",
            operation: "list_users",
            trigger: r"\b(list|show|get|all)\b.*\b(users|members|people)\b|\bslack users\b",
            extractors: &[],
        },
        RuleSpec {
            name: "slack.status",
            operation: "status",
            trigger: r"\bslack\b.*\b(status|connected|connection)\b|\b(check|status)\b.*\bslack\b",
            extractors: &[],
        },
    ],
};
