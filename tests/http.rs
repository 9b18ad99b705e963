use axum::{extract::RawQuery, routing::get, Json, Router};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Snapshot {
    filter: Value,
    data: Value,
    failures: Vec<Value>,
}

struct FakeBackend {
    base_url: String,
    requests: Arc<StdMutex<Vec<String>>>,
}

impl FakeBackend {
    fn take_requests(&self) -> Vec<String> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }
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
static BACKEND: Lazy<FakeBackend> = Lazy::new(spawn_backend);
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

fn recorder(
    requests: Arc<StdMutex<Vec<String>>>,
    path: &'static str,
    body: Value,
) -> axum::routing::MethodRouter {
    get(move |RawQuery(query): RawQuery| {
        let requests = Arc::clone(&requests);
        let body = body.clone();
        async move {
            requests
                .lock()
                .unwrap()
                .push(format!("{path}?{}", query.unwrap_or_default()));
            Json(body)
        }
    })
}

/// Serves canned responses for the five backend paths on its own runtime
/// thread and records every query string it receives.
fn spawn_backend() -> FakeBackend {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind backend port");
    listener.set_nonblocking(true).unwrap();
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(StdMutex::new(Vec::new()));

    let app = Router::new()
        .route(
            "/top-cfr",
            recorder(
                Arc::clone(&requests),
                "/top-cfr",
                json!([{"cfr_code": "21 CFR 211.22", "count": 5}]),
            ),
        )
        .route(
            "/issuing-offices",
            recorder(
                Arc::clone(&requests),
                "/issuing-offices",
                json!([{"issuing_office": "CDER", "count": 3}]),
            ),
        )
        .route(
            "/letters",
            recorder(
                Arc::clone(&requests),
                "/letters",
                json!([{
                    "id": 1,
                    "firm": "Northwind Labs",
                    "product_type": "Drugs",
                    "issuing_office": "CDER",
                    "issue_date": "2024-03-02",
                    "url": "https://fda.example/wl/1"
                }]),
            ),
        )
        .route(
            "/lineage",
            recorder(
                Arc::clone(&requests),
                "/lineage",
                json!([{
                    "letter_id": 1,
                    "source_url": "https://fda.example/wl/1",
                    "fetched_at": "2024-03-03T10:00:00",
                    "sha256_raw": "ab12"
                }]),
            ),
        )
        .route(
            "/top-cfr-trend",
            recorder(
                Arc::clone(&requests),
                "/top-cfr-trend",
                json!({
                    "codes": ["21 CFR 211.22"],
                    "series": [{"period": "2024-03", "21 CFR 211.22": 5}]
                }),
            ),
        );

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("backend runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("backend listener");
            axum::serve(listener, app).await.expect("backend server");
        });
    });

    FakeBackend {
        base_url: format!("http://127.0.0.1:{port}"),
        requests,
    }
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
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

/// Waits for the startup load so its requests cannot leak into a test.
async fn wait_until_loaded(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/dashboard")).send().await {
            if let Ok(snapshot) = resp.json::<Snapshot>().await {
                let data = &snapshot.data;
                let filled = ["top_cfr", "issuing_offices", "letters", "lineage"]
                    .iter()
                    .all(|slice| data[*slice].as_array().is_some_and(|rows| !rows.is_empty()))
                    && data["top_cfr_trend"]["series"]
                        .as_array()
                        .is_some_and(|series| !series.is_empty());
                if filled {
                    return;
                }
            }
        }
        if Instant::now() > deadline {
            panic!("initial load did not finish");
        }
        sleep(Duration::from_millis(50)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_letters_dashboard"))
        .env("PORT", port.to_string())
        .env("API_BASE", &BACKEND.base_url)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;
    wait_until_loaded(&base_url).await;

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

async fn load(client: &Client, server: &TestServer, filter: Value) -> Snapshot {
    let response = client
        .post(format!("{}/api/load", server.base_url))
        .json(&filter)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_load_forwards_filter_to_backend() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    BACKEND.take_requests();

    let snapshot = load(
        &client,
        &server,
        json!({"start": "2024-01-01", "end": "2024-06-30", "product_type": "Drugs"}),
    )
    .await;
    assert!(snapshot.failures.is_empty());
    assert_eq!(snapshot.filter["product_type"], "Drugs");

    let mut requests = BACKEND.take_requests();
    requests.sort();
    assert_eq!(
        requests,
        vec![
            "/issuing-offices?start=2024-01-01&end=2024-06-30",
            "/letters?start=2024-01-01&end=2024-06-30&product_type=Drugs",
            "/lineage?limit=20",
            "/top-cfr-trend?start=2024-01-01&end=2024-06-30&product_type=Drugs",
            "/top-cfr?start=2024-01-01&end=2024-06-30&product_type=Drugs",
        ]
    );
}

#[tokio::test]
async fn http_load_without_product_type_omits_it() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    BACKEND.take_requests();

    load(
        &client,
        &server,
        json!({"start": "2024-01-01", "end": "2024-06-30", "product_type": ""}),
    )
    .await;

    let requests = BACKEND.take_requests();
    assert_eq!(requests.len(), 5);
    assert!(requests.iter().all(|request| !request.contains("product_type")));
}

#[tokio::test]
async fn http_dashboard_exposes_fetched_data() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    load(&client, &server, json!({"start": "2024-01-01", "end": "2024-06-30"})).await;

    let snapshot: Snapshot = client
        .get(format!("{}/api/dashboard", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(snapshot.data["top_cfr"][0]["cfr_code"], "21 CFR 211.22");
    assert_eq!(snapshot.data["issuing_offices"][0]["count"], 3);
    assert_eq!(snapshot.data["letters"][0]["firm"], "Northwind Labs");
    assert_eq!(snapshot.data["lineage"][0]["sha256_raw"], "ab12");
    assert_eq!(snapshot.data["top_cfr_trend"]["series"][0]["21 CFR 211.22"], 5);

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Northwind Labs"));
}

#[tokio::test]
async fn http_letters_csv_downloads_current_letters() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    load(&client, &server, json!({"start": "2024-01-01", "end": "2024-06-30"})).await;

    let response = client
        .get(format!("{}/letters.csv", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"letters.csv\""
    );
    let body = response.text().await.unwrap();
    assert_eq!(
        body,
        "id,firm,product_type,issuing_office,issue_date,url\n\
         1,Northwind Labs,Drugs,CDER,2024-03-02,https://fda.example/wl/1"
    );
}

#[tokio::test]
async fn http_apply_form_redirects_home() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    BACKEND.take_requests();

    let response = client
        .post(format!("{}/apply", server.base_url))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("start=2023-01-01&end=2023-12-31&product_type=Foods")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let requests = BACKEND.take_requests();
    assert!(requests.iter().any(|request| {
        request == "/letters?start=2023-01-01&end=2023-12-31&product_type=Foods"
    }));
    assert!(requests
        .iter()
        .any(|request| request == "/issuing-offices?start=2023-01-01&end=2023-12-31"));
}
