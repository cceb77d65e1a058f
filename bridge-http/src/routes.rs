//! REST routes of the remote server.

use bridge_traits::{CapabilityKind, HttpMethod};

/// How a payload travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteParams {
    /// `(query name, payload key)` pairs. Absent or null keys are omitted.
    Query(&'static [(&'static str, &'static str)]),
    /// The payload object as a JSON body.
    Json,
    /// Nothing is sent.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    pub path: &'static str,
    pub params: RouteParams,
}

const fn get(path: &'static str, query: &'static [(&'static str, &'static str)]) -> Route {
    Route {
        method: HttpMethod::Get,
        path,
        params: RouteParams::Query(query),
    }
}

const fn post(path: &'static str) -> Route {
    Route {
        method: HttpMethod::Post,
        path,
        params: RouteParams::Json,
    }
}

pub fn route(kind: CapabilityKind) -> Route {
    match kind {
        CapabilityKind::ListDirectory => get(
            "/api/fs/list",
            &[("path", "path"), ("respectGitignore", "respectGitignore")],
        ),
        CapabilityKind::SearchFiles => get(
            "/api/fs/search",
            &[
                ("directory", "directory"),
                ("q", "query"),
                ("limit", "maxResults"),
                ("includeHidden", "includeHidden"),
                ("respectGitignore", "respectGitignore"),
            ],
        ),
        CapabilityKind::CreateDirectory => post("/api/fs/mkdir"),
        CapabilityKind::ReadFile => get("/api/fs/read", &[("path", "path")]),
        CapabilityKind::ReadFileBinary => get("/api/fs/raw", &[("path", "path")]),
        CapabilityKind::WriteFile => post("/api/fs/write"),
        CapabilityKind::DeletePath => post("/api/fs/delete"),
        CapabilityKind::RenamePath => post("/api/fs/rename"),
        CapabilityKind::ExecCommands => post("/api/fs/exec"),
        CapabilityKind::GitHubAuthStatus => get("/api/github/auth/status", &[]),
        CapabilityKind::GitHubAuthStart => post("/api/github/auth/start"),
        CapabilityKind::GitHubAuthComplete => post("/api/github/auth/complete"),
        CapabilityKind::GitHubAuthDisconnect => Route {
            method: HttpMethod::Delete,
            path: "/api/github/auth",
            params: RouteParams::Empty,
        },
        CapabilityKind::GitHubMe => get("/api/github/me", &[]),
        CapabilityKind::GitHubPrStatus => get(
            "/api/github/pr/status",
            &[("directory", "directory"), ("branch", "branch")],
        ),
        CapabilityKind::GitHubPrCreate => post("/api/github/pr/create"),
        CapabilityKind::GitHubPrMerge => post("/api/github/pr/merge"),
        CapabilityKind::GitHubPrReady => post("/api/github/pr/ready"),
    }
}
