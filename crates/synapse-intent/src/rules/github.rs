//! GitHub rules.

use synapse_kernel::{ExtractorSpec, RuleSetSpec, RuleSpec, ServiceId, Source, ValueKind};

use super::QUOTED;

const REPO_PATTERN: &str = r#"\b(?:repo|repository)\s+["']?([\w-]+(?:[./][\w-]+)*)"#;
const OWNER_SLASH_NAME: &str = r#"\b(?:to|in|on|of|from|for)\s+["']?([\w-]+/[\w-]+(?:\.[\w-]+)*)"#;
const VERB_OWNER_SLASH_NAME: &str =
    r#"\b(?:fork|star|unstar|delete|remove)\s+["']?([\w-]+/[\w-]+(?:\.[\w-]+)*)"#;
const FILE_PATTERNS: &[&str] = &[
    r#"\b(?:file|path)\s+["']?([\w./-]*\.\w+)"#,
    r#"(?:^|\s)["']?((?:[\w-]+/)*[\w-]+\.[A-Za-z0-9]+)\b"#,
];

const REPO: ExtractorSpec = ExtractorSpec {
    param: "repo",
    sources: &[Source::Capture {
        patterns: &[REPO_PATTERN, OWNER_SLASH_NAME, VERB_OWNER_SLASH_NAME],
        kind: ValueKind::Name,
    }],
    mandatory: true,
};

const STATE: ExtractorSpec = ExtractorSpec {
    param: "state",
    sources: &[Source::Choice {
        options: &[("closed", "closed"), ("all", "all")],
        otherwise: Some("open"),
    }],
    mandatory: true,
};

const ISSUE_NUMBER: ExtractorSpec = ExtractorSpec {
    param: "issue_number",
    sources: &[Source::Capture {
        patterns: &[r"\bissue\s+#?(\w+)", r"#(\d+)\b"],
        kind: ValueKind::Integer,
    }],
    mandatory: true,
};

const PR_NUMBER: ExtractorSpec = ExtractorSpec {
    param: "pr_number",
    sources: &[Source::Capture {
        patterns: &[r"\b(?:pr|pull request)\s+#?(\w+)", r"#(\d+)\b"],
        kind: ValueKind::Integer,
    }],
    mandatory: true,
};

const FILE_PATH: ExtractorSpec = ExtractorSpec {
    param: "file_path",
    sources: &[Source::Capture {
        patterns: FILE_PATTERNS,
        kind: ValueKind::Text,
    }],
    mandatory: true,
};

const BRANCH: ExtractorSpec = ExtractorSpec {
    param: "branch",
    sources: &[Source::Capture {
        patterns: &[
            r#"\bbranch\s+["']?([\w-]+(?:[./][\w-]+)*)"#,
            r"\bon\s+(?:the\s+)?([\w-]+(?:[./][\w-]+)*)\s+branch\b",
        ],
        kind: ValueKind::Text,
    }],
    mandatory: false,
};

const BRANCH_NAME: ExtractorSpec = ExtractorSpec {
    param: "branch_name",
    sources: &[Source::Capture {
        patterns: &[
            r#"\b(?:called|named)\s+["']?([\w-]+(?:[./][\w-]+)*)"#,
            r#"\bbranch\s+["']?([\w-]+(?:[./][\w-]+)*)"#,
        ],
        kind: ValueKind::Text,
    }],
    mandatory: true,
};

const PER_PAGE: ExtractorSpec = ExtractorSpec {
    param: "per_page",
    sources: &[Source::Capture {
        patterns: &[r"\b(?:last|latest|recent|top|first)\s+(\d+)\b"],
        kind: ValueKind::Integer,
    }],
    mandatory: false,
};

/// GitHub rule family.
pub static GITHUB: RuleSetSpec = RuleSetSpec {
    service: ServiceId::GitHub,
    vocabulary: &[
        "github",
        "repo",
        "pull request",
        "pr",
        "issue",
        "commit",
        "branch",
        "fork",
        "star",
        "push",
        "merge",
    ],
    rules: &[
        // -- Sub-resource listings ---------------------------------------
        RuleSpec {
            name: "github.list_issues",
            operation: "list_issues",
            trigger: r"\b(list|show|get|view)\b.*\bissues?\b",
            extractors: &[REPO, STATE],
        },
        RuleSpec {
            name: "github.list_prs",
            operation: "list_prs",
            trigger: r"\b(list|show|get|view)\b.*\b(prs?|pull requests?)\b|\bopen prs\b",
            extractors: &[REPO, STATE],
        },
        RuleSpec {
            name: "github.get_commits",
            operation: "get_commits",
            trigger: r"\b(list|show|get|view)\b.*\bcommits\b|\bcommit (history|log)\b",
            extractors: &[REPO, PER_PAGE],
        },
        // -- Issues --------------------------------------------------------
        RuleSpec {
            name: "github.comment_issue",
            operation: "comment_issue",
            trigger: r"\bcomment\b.*\bissue\b|\bissue\b.*\bcomment\b",
            extractors: &[
                REPO,
                ISSUE_NUMBER,
                ExtractorSpec {
                    param: "comment",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("comment|saying|with|message"), QUOTED],
                        kind: ValueKind::Text,
                    }],
                    mandatory: true,
                },
            ],
        },
        RuleSpec {
            name: "github.open_issue",
            operation: "open_issue",
            trigger: r"\breopen\b.*\bissue\b",
            extractors: &[REPO, ISSUE_NUMBER],
        },
        RuleSpec {
            name: "github.close_issue",
            operation: "close_issue",
            trigger: r"\b(close|resolve)\b.*\bissue\b",
            extractors: &[REPO, ISSUE_NUMBER],
        },
        RuleSpec {
            name: "github.create_issue",
            operation: "create_issue",
            trigger: r"\b(create|new|file|open|raise)\b.*\bissue\b",
            extractors: &[
                REPO,
                ExtractorSpec {
                    param: "title",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("title|titled|called|named"), QUOTED],
                        kind: ValueKind::Text,
                    }],
                    mandatory: true,
                },
                ExtractorSpec {
                    param: "body",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("body|description|saying|details")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "labels",
                    sources: &[Source::Capture {
                        patterns: &[
                            quoted_after!("labels?|labeled|tagged"),
                            r"\b(?:labels?|labeled|tagged)\s+([\w-]+(?:\s*,\s*[\w-]+)*)",
                        ],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
            ],
        },
        // -- Pull requests -------------------------------------------------
        RuleSpec {
            name: "github.merge_pr",
            operation: "merge_pr",
            trigger: r"\bmerge\b.*\b(pr|pull request)\b",
            extractors: &[
                REPO,
                PR_NUMBER,
                ExtractorSpec {
                    param: "merge_method",
                    sources: &[Source::Choice {
                        options: &[("squash", "squash"), ("rebase", "rebase")],
                        otherwise: None,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "commit_message",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("message|msg")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
            ],
        },
        RuleSpec {
            name: "github.close_pr",
            operation: "close_pr",
            trigger: r"\bclose\b.*\b(pr|pull request)\b",
            extractors: &[REPO, PR_NUMBER],
        },
        RuleSpec {
            name: "github.create_pr",
            operation: "create_pr",
            trigger: r"\b(create|open|new|make)\b.*\b(pr|pull request)\b",
            extractors: &[
                REPO,
                ExtractorSpec {
                    param: "title",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("title|titled|called|named"), QUOTED],
                        kind: ValueKind::Text,
                    }],
                    mandatory: true,
                },
                ExtractorSpec {
                    param: "head",
                    sources: &[Source::Capture {
                        patterns: &[r#"\b(?:from|head)\s+(?:branch\s+)?["']?([\w-]+(?:[./][\w-]+)*)"#],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "base",
                    sources: &[Source::Capture {
                        patterns: &[r#"\b(?:into|base|onto)\s+(?:branch\s+)?["']?([\w-]+(?:[./][\w-]+)*)"#],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "body",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("body|description|saying")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
            ],
        },
        // -- Files ---------------------------------------------------------
        RuleSpec {
            name: "github.get_file_info",
            operation: "get_file_info",
            trigger: r"\bfile (info|details|metadata)\b|\binfo (about|for|on) (the )?file\b|\bsha of\b",
            extractors: &[REPO, FILE_PATH, BRANCH],
        },
        RuleSpec {
            name: "github.read_file",
            operation: "read_file",
            trigger: r"\b(read|show|get|cat|view|open|print)\b.*\bfile\b|\bcontents? of\b",
            extractors: &[REPO, FILE_PATH, BRANCH],
        },
        RuleSpec {
            name: "github.push_commit",
            operation: "push_commit",
            trigger: r"\bpush\b|\bcommit\b.*\bfile\b|\b(add|update|upload)\b.*\bfile\b",
            extractors: &[
                REPO,
                FILE_PATH,
                BRANCH,
                ExtractorSpec {
                    param: "message",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("message|msg")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "content",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("content|contents|containing|text")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
            ],
        },
        // -- Branches ------------------------------------------------------
        RuleSpec {
            name: "github.create_branch",
            operation: "create_branch",
            trigger: r"\b(create|new|make)\b.*\bbranch\b",
            extractors: &[
                REPO,
                BRANCH_NAME,
                ExtractorSpec {
                    param: "source_branch",
                    sources: &[Source::Capture {
                        patterns: &[r#"\b(?:from|off)\s+(?:branch\s+)?["']?([\w-]+(?:[./][\w-]+)*)"#],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
            ],
        },
        RuleSpec {
            name: "github.delete_branch",
            operation: "delete_branch",
            trigger: r"\b(delete|remove)\b.*\bbranch\b",
            extractors: &[REPO, BRANCH_NAME],
        },
        // -- Repositories --------------------------------------------------
        RuleSpec {
            name: "github.create_repo",
            operation: "create_repo",
            trigger: r"\b(create|make)\s+(a\s+)?(new\s+)?((private|public)\s+)?(github\s+)?repo(sitory)?\b|\bnew\s+((private|public)\s+)?repo(sitory)?\b",
            extractors: &[
                ExtractorSpec {
                    param: "name",
                    sources: &[Source::Capture {
                        patterns: &[
                            r#"\b(?:called|named|name\s+is)\s+["']?(\w[\w.-]*)"#,
                            r#"\brepo(?:sitory)?\s+["']?(\w[\w.-]*)"#,
                        ],
                        kind: ValueKind::Name,
                    }],
                    mandatory: true,
                },
                ExtractorSpec {
                    param: "description",
                    sources: &[Source::Capture {
                        patterns: &[quoted_after!("description|described as|about")],
                        kind: ValueKind::Text,
                    }],
                    mandatory: false,
                },
                ExtractorSpec {
                    param: "private",
                    sources: &[Source::Flag {
                        keywords: &["private"],
                    }],
                    mandatory: false,
                },
            ],
        },
        RuleSpec {
            name: "github.delete_repo",
            operation: "delete_repo",
            trigger: r"\b(delete|remove)\b.*\brepo(sitory)?\b",
            extractors: &[REPO],
        },
        RuleSpec {
            name: "github.fork_repo",
            operation: "fork_repo",
            trigger: r"\bfork\b",
            extractors: &[REPO],
        },
        RuleSpec {
            name: "github.unstar_repo",
            operation: "unstar_repo",
            trigger: r"\bunstar\b",
            extractors: &[REPO],
        },
        RuleSpec {
            name: "github.star_repo",
            operation: "star_repo",
            trigger: r"\bstar\b",
            extractors: &[REPO],
        },
        RuleSpec {
            name: "github.list_repos",
            operation: "list_repos",
            trigger: r"\b(list|show)\b.*\brepo|\bmy repos\b|\bgithub\b.*\brepos\b",
            extractors: &[],
        },
        RuleSpec {
            name: "github.status",
            operation: "status",
            trigger: r"\bgithub\b.*\b(status|connected|connection)\b|\b(check|status)\b.*\bgithub\b",
            extractors: &[],
        },
    ],
};
