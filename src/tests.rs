use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::errors::GameJoltError;
use crate::signature::sign;
use crate::transport::Transport;
use crate::{Client, ClientOptions, Credentials, FailurePolicy, TrophyFilter};

const ROOT: &str = "https://gj.test/api/game/v1";
const GAME_ID: &str = "77";
const PRIVATE_KEY: &str = "f00dfeed";

enum MockReply {
    Body(String),
    Status(u16),
    Down,
}

#[derive(Default)]
struct MockState {
    replies: VecDeque<MockReply>,
    requests: Vec<String>,
}

/// In-memory transport: replays queued replies in order and records every URL.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(&self, body: &str) {
        self.push(MockReply::Body(body.to_string()));
    }

    pub(crate) fn fail_with_status(&self, status: u16) {
        self.push(MockReply::Status(status));
    }

    pub(crate) fn go_down(&self) {
        self.push(MockReply::Down);
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    fn push(&self, reply: MockReply) {
        self.state.lock().unwrap().replies.push_back(reply);
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str) -> Result<String, GameJoltError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(url.to_string());

        match state.replies.pop_front() {
            Some(MockReply::Body(body)) => Ok(body),
            Some(MockReply::Status(status)) => Err(GameJoltError::HttpStatus {
                url: url.to_string(),
                status,
            }),
            Some(MockReply::Down) | None => Err(GameJoltError::Transport {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn client(transport: &MockTransport, policy: FailurePolicy) -> Client {
    init_tracing();
    let options = ClientOptions {
        service_root: ROOT.to_string(),
        policy,
        ..ClientOptions::default()
    };
    Client::with_transport(options, transport.clone())
}

fn credentials() -> Credentials {
    Credentials::new(GAME_ID, PRIVATE_KEY, "tricky", "tok").unwrap()
}

/// Logs in against a transport that accepts the auth call.
fn logged_in(transport: &MockTransport, policy: FailurePolicy) -> crate::User {
    transport.reply("success:\"true\"");
    let user = client(transport, policy).login(credentials());
    assert!(user.logged_in());
    user
}

/// Strips the signature, checking it matches the rest of the URL.
fn unsigned(url: &str) -> &str {
    let (base, signature) = url.rsplit_once("&signature=").unwrap();
    assert_eq!(signature, sign(base, PRIVATE_KEY));
    base
}

#[test]
fn login_signs_identity_request() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);

    assert_eq!(user.username(), "tricky");
    assert_eq!(
        unsigned(&transport.requests()[0]),
        "https://gj.test/api/game/v1/users/auth/?username=tricky&user_token=tok&game_id=77"
    );
}

#[test]
fn rejected_login_is_not_an_error() {
    let transport = MockTransport::new();
    transport.reply("success:\"false\"\nmessage:\"No such user with the credentials passed in could be found.\"");

    let user = client(&transport, FailurePolicy::Propagate).login(credentials());

    assert!(!user.logged_in());
}

#[test]
fn unreachable_service_fails_login() {
    let transport = MockTransport::new();
    transport.go_down();

    let user = client(&transport, FailurePolicy::Propagate).login(credentials());

    assert!(!user.logged_in());
}

#[test]
fn lenient_login_reads_success_flag() {
    let transport = MockTransport::new();
    transport.reply("success:\"false\"\nmessage:\"bad token\"");

    let user = client(&transport, FailurePolicy::LogAndContinue).login(credentials());

    assert!(!user.logged_in());
}

#[test]
fn submit_score_escapes_spaces_and_omits_empty_table() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    transport.reply("success:\"true\"");

    assert!(user.submit_score("12 000", "desc", Some("")).unwrap());

    let url = transport.requests()[1].clone();
    assert_eq!(
        unsigned(&url),
        "https://gj.test/api/game/v1/scores/add/?score=12+000&sort=desc&username=tricky&user_token=tok&game_id=77"
    );
    assert!(!url.contains("table_id"));
}

#[test]
fn submit_score_with_table() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    transport.reply("success:\"true\"");

    assert!(user.submit_score("5 laps", "5", Some("1234")).unwrap());
    assert!(unsigned(&transport.requests()[1]).contains("&sort=5&table_id=1234&username="));
}

#[test]
fn rejected_score_is_service_error() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    transport.reply("success:\"false\"\nmessage:\"bad token\"");

    let err = user.submit_score("1", "1", None).unwrap_err();

    assert!(err.is_service());
    assert_eq!(err.to_string(), "Game Jolt request failed: bad token");
}

#[test]
fn rejected_score_is_false_when_lenient() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::LogAndContinue);
    transport.reply("success:\"false\"\nmessage:\"bad token\"");

    assert!(!user.submit_score("1", "1", None).unwrap());
}

#[test]
fn fetch_scores_for_user() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    transport.reply("success:\"true\"\nscore:\"12 000\"\nsort:\"12000\"\nscore:\"9 000\"\nsort:\"9000\"");

    let record = user.fetch_scores(Some("10"), None).unwrap();

    assert_eq!(record.values_of("sort"), vec!["12000", "9000"]);
    assert_eq!(
        unsigned(&transport.requests()[1]),
        "https://gj.test/api/game/v1/scores/?username=tricky&user_token=tok&limit=10&game_id=77"
    );
}

#[test]
fn session_lifecycle_actions() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    for _ in 0..4 {
        transport.reply("success:\"true\"");
    }

    user.open_session().unwrap();
    user.ping().unwrap();
    user.start_session().unwrap();
    user.close_session().unwrap();

    let actions: Vec<String> = transport.requests()[1..]
        .iter()
        .map(|url| {
            url.trim_start_matches(ROOT)
                .split("/?")
                .next()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(
        actions,
        vec!["/sessions/open", "/sessions/ping", "/sessions/open", "/sessions/close"]
    );
}

#[test]
fn ping_propagates_transport_failure() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    transport.fail_with_status(502);

    assert!(matches!(
        user.ping(),
        Err(GameJoltError::HttpStatus { status: 502, .. })
    ));
}

#[test]
fn award_trophy_sends_trophy_id() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    transport.reply("success:\"true\"");

    assert!(user.award_trophy("5").unwrap());
    assert_eq!(
        unsigned(&transport.requests()[1]),
        "https://gj.test/api/game/v1/trophies/add-achieved/?trophy_id=5&username=tricky&user_token=tok&game_id=77"
    );
}

#[test]
fn trophy_catalog_round_trip() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    transport.reply(
        "success:\"true\"\n\
         id:\"5\"\ntitle:\"First Blood\"\ndifficulty:\"Bronze\"\n\
         description:\"Kill one enemy\"\nimage_url:\"http://x/1.png\"\nachieved:\"false\"\n\
         id:\"6\"\ntitle:\"Veteran\"\ndifficulty:\"Gold\"\n\
         description:\"Win 100 rounds\"\nimage_url:\"http://x/2.png\"\nachieved:\"2 weeks ago\"\n",
    );
    transport.reply("success:\"true\"");

    let catalog = user.fetch_trophies().unwrap();

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get(5).unwrap().name, "First Blood");
    let achieved: Vec<i64> = catalog.achieved().map(|t| t.id).collect();
    assert_eq!(achieved, vec![6]);

    assert!(catalog.award(5).unwrap());
    assert_eq!(
        unsigned(&transport.requests()[2]),
        "https://gj.test/api/game/v1/trophies/add-achieved/?trophy_id=5&username=tricky&user_token=tok&game_id=77"
    );
}

#[test]
fn trophy_filter_adds_achieved_param() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    transport.reply("success:\"true\"");

    let catalog = user.fetch_trophies_filtered(TrophyFilter::Unachieved).unwrap();

    assert!(catalog.is_empty());
    assert_eq!(
        unsigned(&transport.requests()[1]),
        "https://gj.test/api/game/v1/trophies/?achieved=false&username=tricky&user_token=tok&game_id=77"
    );
}

#[test]
fn failed_trophy_fetch_has_no_partial_catalog() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    transport.reply("success:\"false\"\nmessage:\"bad token\"");

    match user.fetch_trophies() {
        Err(GameJoltError::Service { message }) => assert_eq!(message, "bad token"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn lenient_trophy_fetch_returns_empty_catalog() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::LogAndContinue);
    transport.reply("success:\"true\"\ntitle:\"X\"\nid:\"1\"");

    let catalog = user.fetch_trophies().unwrap();

    assert!(catalog.is_empty());
}

#[test]
fn error_hook_fires_for_trophy_errors() {
    let transport = MockTransport::new();
    transport.reply("success:\"true\"");
    let count = Arc::new(Mutex::new(0));
    let seen = count.clone();
    let user = client(&transport, FailurePolicy::Propagate)
        .on_error(move |_| *seen.lock().unwrap() += 1)
        .login(credentials());
    transport.reply("success:\"true\"\nid:\"1\"\nbogus:\"x\"");

    let err = user.fetch_trophies().unwrap_err();

    assert!(err.is_decode());
    assert_eq!(*count.lock().unwrap(), 1);
}

// Known divergence from the legacy client, which swallowed every internal
// failure into a null result: transport errors surface even when lenient.
#[test]
fn lenient_policy_still_surfaces_transport_errors() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::LogAndContinue);
    transport.go_down();

    let err = user.fetch_scores(None, None).unwrap_err();

    assert!(err.is_transport());
}

#[test]
fn independent_users_run_concurrently() {
    let handles: Vec<_> = [FailurePolicy::Propagate, FailurePolicy::LogAndContinue]
        .into_iter()
        .map(|policy| {
            std::thread::spawn(move || {
                let transport = MockTransport::new();
                let user = logged_in(&transport, policy);
                transport.reply("success:\"false\"\nmessage:\"nope\"");
                user.submit_score("1", "1", None).is_ok()
            })
        })
        .collect();

    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![false, true]);
}

#[test]
fn empty_trophy_reply_is_not_an_empty_catalog() {
    let transport = MockTransport::new();
    let user = logged_in(&transport, FailurePolicy::Propagate);
    transport.reply("");

    let err = user.fetch_trophies().unwrap_err();

    assert!(err.is_service());
}
