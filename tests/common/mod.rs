//! In-memory stand-in for the Access projects API, served through wiremock

#![allow(dead_code)]

use access_projects::api::AccessClient;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const PREFIX: [&str; 4] = ["access", "api", "v1", "projects"];

#[derive(Default)]
struct AccessState {
    projects: BTreeMap<String, Value>,
    /// (project key, "users"/"groups", name) -> membership body
    memberships: BTreeMap<(String, String, String), Value>,
    users: BTreeSet<String>,
    groups: BTreeSet<String>,
}

/// Stateful fake of the project, user and group endpoints
#[derive(Clone, Default)]
pub struct FakeAccess {
    state: Arc<Mutex<AccessState>>,
}

impl FakeAccess {
    pub fn with_users(self, users: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .users
            .extend(users.iter().map(|u| u.to_string()));
        self
    }

    pub fn with_groups(self, groups: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .groups
            .extend(groups.iter().map(|g| g.to_string()));
        self
    }

    pub fn project(&self, key: &str) -> Option<Value> {
        self.state.lock().unwrap().projects.get(key).cloned()
    }

    pub fn membership(&self, key: &str, kind: &str, name: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .memberships
            .get(&(key.to_string(), kind.to_string(), name.to_string()))
            .cloned()
    }

    pub fn membership_count(&self) -> usize {
        self.state.lock().unwrap().memberships.len()
    }

    fn handle(&self, method: &str, rest: &[String], body: &[u8]) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

        match (method, rest.as_slice()) {
            ("POST", []) => {
                let Ok(project) = serde_json::from_slice::<Value>(body) else {
                    return ResponseTemplate::new(400);
                };
                let Some(key) = project["project_key"].as_str().map(str::to_string) else {
                    return ResponseTemplate::new(400);
                };
                if state.projects.contains_key(&key) {
                    return ResponseTemplate::new(409);
                }
                state.projects.insert(key, project.clone());
                ResponseTemplate::new(201).set_body_json(project)
            }
            ("GET", [key]) => match state.projects.get(*key) {
                Some(project) => ResponseTemplate::new(200).set_body_json(project),
                None => ResponseTemplate::new(404),
            },
            ("HEAD", [key]) => {
                let status = if state.projects.contains_key(*key) { 200 } else { 404 };
                ResponseTemplate::new(status)
            }
            ("PUT", [key]) => {
                if !state.projects.contains_key(*key) {
                    return ResponseTemplate::new(404);
                }
                let Ok(project) = serde_json::from_slice::<Value>(body) else {
                    return ResponseTemplate::new(400);
                };
                state.projects.insert(key.to_string(), project.clone());
                ResponseTemplate::new(200).set_body_json(project)
            }
            ("DELETE", [key]) => match state.projects.remove(*key) {
                Some(_) => ResponseTemplate::new(204),
                None => ResponseTemplate::new(404),
            },
            ("GET", [key, kind]) => {
                if !state.projects.contains_key(*key) {
                    return ResponseTemplate::new(404);
                }
                let members: Vec<Value> = state
                    .memberships
                    .iter()
                    .filter(|((k, t, _), _)| k == key && t == kind)
                    .map(|(_, m)| m.clone())
                    .collect();
                ResponseTemplate::new(200).set_body_json(json!({ "members": members }))
            }
            ("GET", [key, kind, name]) => {
                match state
                    .memberships
                    .get(&(key.to_string(), kind.to_string(), name.to_string()))
                {
                    Some(membership) => ResponseTemplate::new(200).set_body_json(membership),
                    None => ResponseTemplate::new(404),
                }
            }
            ("PUT", [key, kind, name]) => {
                let known = match *kind {
                    "users" => state.users.contains(*name),
                    "groups" => state.groups.contains(*name),
                    _ => false,
                };
                if !state.projects.contains_key(*key) || !known {
                    return ResponseTemplate::new(404);
                }
                let Ok(membership) = serde_json::from_slice::<Value>(body) else {
                    return ResponseTemplate::new(400);
                };
                if membership["name"] != *name {
                    return ResponseTemplate::new(400);
                }
                state
                    .memberships
                    .insert((key.to_string(), kind.to_string(), name.to_string()), membership.clone());
                ResponseTemplate::new(200).set_body_json(membership)
            }
            ("DELETE", [key, kind, name]) => {
                match state
                    .memberships
                    .remove(&(key.to_string(), kind.to_string(), name.to_string()))
                {
                    Some(_) => ResponseTemplate::new(204),
                    None => ResponseTemplate::new(404),
                }
            }
            _ => ResponseTemplate::new(405),
        }
    }
}

impl Respond for FakeAccess {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let segments: Vec<String> = request
            .url
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_else(|_| s.to_string()))
            .collect();

        if segments.len() < PREFIX.len() || segments[..PREFIX.len()] != PREFIX {
            return ResponseTemplate::new(404);
        }

        self.handle(request.method.as_str(), &segments[PREFIX.len()..], &request.body)
    }
}

/// Start a mock server backed by `fake` and a client pointed at it
pub async fn start(fake: &FakeAccess) -> (MockServer, AccessClient) {
    let server = MockServer::start().await;

    Mock::given(path_regex(r"^/access/api/v1/projects"))
        .respond_with(fake.clone())
        .mount(&server)
        .await;

    let client = AccessClient::new(&server.uri(), "test-token", Duration::from_secs(5))
        .expect("client for mock server");

    (server, client)
}

/// Requests the server saw with the given method
pub async fn count_requests(server: &MockServer, method: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == method)
        .count()
}
