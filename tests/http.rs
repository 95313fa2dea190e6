use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const BASE: &str = "/pwa-timer/";

#[derive(Debug, Deserialize)]
struct Preferences {
    #[serde(rename = "notificationEnabled")]
    notification_enabled: bool,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    running: bool,
    remaining: i64,
    preferences: Preferences,
}

#[derive(Debug, Deserialize)]
struct LifecycleResponse {
    active: String,
    phase: String,
    waiting: Option<String>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("pwa_timer_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}{BASE}api/lifecycle")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_pwa_timer"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("TIMER_REMOTE_RESOURCES", "")
        .env("TIMER_UPDATE_CHECK_SECS", "0")
        .env_remove("TIMER_ASSET_DIR")
        .env_remove("TIMER_BASE_PATH")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

#[tokio::test]
async fn http_root_redirects_to_base_path() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let response = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(
        response.headers().get(reqwest::header::LOCATION).unwrap(),
        BASE
    );
}

#[tokio::test]
async fn http_serves_cached_app_shell() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let index = client
        .get(format!("{}{BASE}", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(index.status().is_success());
    assert!(index
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(index.text().await.unwrap().contains("PWA Timer"));

    let script = client
        .get(format!("{}{BASE}assets/main.js", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(script.status().is_success());
    assert!(script.text().await.unwrap().contains("timer/requestStatus"));

    let manifest: serde_json::Value = client
        .get(format!("{}{BASE}manifest.json", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(manifest["name"], "PWA Timer");
}

#[tokio::test]
async fn http_unknown_resources_are_not_found() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let missing = client
        .get(format!("{}{BASE}assets/missing.png", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let outside = client
        .get(format!("{}/elsewhere", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(outside.status(), reqwest::StatusCode::NOT_FOUND);

    let remote = client
        .get(format!("{}{BASE}_remote", server.base_url))
        .query(&[("url", "https://example.com/tracker.js")])
        .send()
        .await
        .unwrap();
    assert_eq!(remote.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_status_starts_idle() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let status: StatusResponse = client
        .get(format!("{}{BASE}api/status", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!status.running);
    assert_eq!(status.remaining, 0);
    assert!(!status.preferences.notification_enabled);
}

#[tokio::test]
async fn http_lifecycle_reports_active_version() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let lifecycle: LifecycleResponse = client
        .get(format!("{}{BASE}api/lifecycle", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(lifecycle.active, env!("CARGO_PKG_VERSION"));
    assert_eq!(lifecycle.phase, "active");
    assert!(lifecycle.waiting.is_none());

    let checked: LifecycleResponse = client
        .post(format!("{}{BASE}api/update", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(checked.active, lifecycle.active);
}

#[tokio::test]
async fn http_skip_waiting_without_waiting_version_conflicts() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}{BASE}api/skip-waiting", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
}

#[tokio::test]
async fn http_push_is_accepted() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}{BASE}api/push", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
}
