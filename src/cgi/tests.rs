//! Engine tests against a scripted transport.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Notify, oneshot};

use super::{
    CameraClient, CommandRequest, CommandResult, ConfigSection, Endpoint, Execution, Params, Payload, ResultCode, Transport,
    TransportError,
};

/// Transport that answers from a table keyed by command name and records every URL.
#[derive(Default)]
struct SpyTransport {
    replies: HashMap<String, Vec<u8>>,
    urls: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl SpyTransport {
    fn reply(mut self, cmd: &str, body: &str) -> Self {
        self.replies.insert(cmd.to_string(), body.as_bytes().to_vec());
        self
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl Transport for SpyTransport {
    fn send(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send {
        self.urls.lock().unwrap().push(url.to_string());
        let reply = command_of(url).and_then(|cmd| self.replies.get(&cmd).cloned());
        let gate = self.gate.clone();
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            reply.ok_or_else(|| TransportError::Connect("no route to camera".to_string()))
        }
    }
}

fn command_of(url: &str) -> Option<String> {
    let url = url::Url::parse(url).ok()?;
    url.query_pairs().find(|(k, _)| k == "cmd").map(|(_, v)| v.into_owned())
}

fn query_of(url: &str) -> Vec<(String, String)> {
    url::Url::parse(url)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn endpoint() -> Endpoint {
    Endpoint::new("192.168.1.20", 88, "admin", "secret").unwrap()
}

fn detached_endpoint() -> Endpoint {
    Endpoint::builder("192.168.1.20", 88, "admin", "secret")
        .detached(true)
        .build()
        .unwrap()
}

const MOTION_CONFIG: &str = "<CGI_Result><result>0</result><isEnable>0</isEnable><linkage>12</linkage><snapInterval>2</snapInterval><sensitivity>1</sensitivity><triggerInterval>5</triggerInterval><schedule0>281474976710655</schedule0></CGI_Result>";
const OK: &str = "<CGI_Result><result>0</result></CGI_Result>";

#[tokio::test]
async fn test_execute_decodes_reply() {
    let transport = SpyTransport::default().reply(
        "getIPInfo",
        "<CGI_Result><result>0</result><isDHCP>1</isDHCP><ip>192.168.1.20</ip></CGI_Result>",
    );
    let client = CameraClient::with_transport(endpoint(), transport);

    let result = client.execute("getIPInfo", Params::new()).await;
    assert_eq!(result.code, ResultCode::Success);
    let fields = result.fields().unwrap();
    assert_eq!(fields.keys().collect::<Vec<_>>(), ["isDHCP", "ip"]);
    assert_eq!(fields.text("ip"), Some("192.168.1.20"));
}

#[tokio::test]
async fn test_transport_failure_is_unavailable() {
    let client = CameraClient::with_transport(endpoint(), SpyTransport::default());

    let result = client.execute("getDevState", Params::new()).await;
    assert_eq!(result.code, ResultCode::Unavailable);
    assert_eq!(result.payload, Payload::None);

    let raw = client.send_command(&CommandRequest::new("snapPicture2").raw()).await;
    assert_eq!(raw.code, ResultCode::Unavailable);
    assert!(raw.raw_bytes().is_none());
}

#[tokio::test]
async fn test_request_url_carries_credentials_and_params() {
    let client = CameraClient::with_transport(endpoint(), SpyTransport::default().reply("getLog", OK));

    client.get_log(20, 10, None).await;

    let urls = client_urls(&client);
    assert_eq!(urls.len(), 1);
    assert!(urls[0].starts_with("http://192.168.1.20:88/cgi-bin/CGIProxy.fcgi?"));
    let query = query_of(&urls[0]);
    let keys: Vec<&str> = query.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["usr", "pwd", "cmd", "offset", "count"]);
    assert_eq!(query[3].1, "20");
}

#[tokio::test]
async fn test_raw_mode_returns_body() {
    let client = CameraClient::with_transport(endpoint(), SpyTransport::default().reply("snapPicture2", "\u{7f}JPEGDATA"));

    let result = client.snap_picture_2(None).await.completed().unwrap();
    assert!(result.is_success());
    assert_eq!(result.raw_bytes(), Some(&b"\x7fJPEGDATA"[..]));
}

#[tokio::test]
async fn test_sync_callback_runs_before_return() {
    let client = CameraClient::with_transport(endpoint(), SpyTransport::default().reply("getDevState", OK));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let execution = client
        .get_dev_state(Some(Box::new(move |result: &CommandResult| {
            assert!(result.is_success());
            counter.fetch_add(1, Ordering::SeqCst);
        })))
        .await;

    assert!(!execution.is_detached());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_detached_returns_before_callback() {
    let gate = Arc::new(Notify::new());
    let transport = SpyTransport::default().reply("getDevState", OK).gated(Arc::clone(&gate));
    let client = CameraClient::with_transport(detached_endpoint(), transport);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let (tx, rx) = oneshot::channel();

    let execution = client
        .get_dev_state(Some(Box::new(move |result: &CommandResult| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(result.code);
        })))
        .await;

    let Execution::Detached(call) = execution else {
        panic!("expected a detached call");
    };
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    gate.notify_one();
    let code = tokio::time::timeout(Duration::from_secs(5), rx).await.unwrap().unwrap();
    assert_eq!(code, ResultCode::Success);

    let result = call.join().await.unwrap();
    assert!(result.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_detached_failure_reported_through_callback() {
    let client = CameraClient::with_transport(detached_endpoint(), SpyTransport::default());
    let (tx, rx) = oneshot::channel();

    let execution = client
        .get_ip_info(Some(Box::new(move |result: &CommandResult| {
            let _ = tx.send((result.code, result.fields().is_none()));
        })))
        .await;
    assert!(execution.completed().is_none());

    let (code, no_fields) = tokio::time::timeout(Duration::from_secs(5), rx).await.unwrap().unwrap();
    assert_eq!(code, ResultCode::Unavailable);
    assert!(no_fields);
}

#[tokio::test]
async fn test_dropped_handle_still_completes() {
    let client = CameraClient::with_transport(endpoint(), SpyTransport::default().reply("ptzStopRun", OK))
        .with_detached_limit(1);
    let (tx, rx) = oneshot::channel();

    drop(client.spawn_command(
        CommandRequest::new("ptzStopRun"),
        Some(Box::new(move |result: &CommandResult| {
            let _ = tx.send(result.code);
        })),
    ));

    let code = tokio::time::timeout(Duration::from_secs(5), rx).await.unwrap().unwrap();
    assert_eq!(code, ResultCode::Success);
}

#[tokio::test]
async fn test_detached_limit_runs_every_call() {
    let client = CameraClient::with_transport(endpoint(), SpyTransport::default().reply("getDevState", OK))
        .with_detached_limit(2);

    let calls: Vec<_> = (0..6)
        .map(|_| client.spawn_command(CommandRequest::new("getDevState"), None))
        .collect();
    for call in calls {
        assert!(call.join().await.unwrap().is_success());
    }
    assert_eq!(client_urls(&client).len(), 6);
}

#[tokio::test]
async fn test_set_motion_detection_round_trip() {
    let transport = SpyTransport::default()
        .reply("getMotionDetectConfig", MOTION_CONFIG)
        .reply("setMotionDetectConfig", OK);
    let client = CameraClient::with_transport(endpoint(), transport);

    let code = client.enable_motion_detection().await;
    assert_eq!(code, ResultCode::Success);

    let urls = client_urls(&client);
    assert_eq!(urls.len(), 2);
    let query = query_of(&urls[1]);
    let params: Vec<(&str, &str)> = query.iter().skip(3).map(|(k, v)| (k.as_str(), v.as_str())).collect();
    assert_eq!(
        params,
        [
            ("isEnable", "1"),
            ("linkage", "12"),
            ("snapInterval", "2"),
            ("sensitivity", "1"),
            ("triggerInterval", "5"),
            ("schedule0", "281474976710655"),
        ]
    );
}

#[tokio::test]
async fn test_composite_returns_set_code() {
    let transport = SpyTransport::default()
        .reply("getMotionDetectConfig", MOTION_CONFIG)
        .reply("setMotionDetectConfig", "<CGI_Result><result>-4</result></CGI_Result>");
    let client = CameraClient::with_transport(endpoint(), transport);

    assert_eq!(client.disable_motion_detection().await, ResultCode::ExecutionFailed);
}

#[tokio::test]
async fn test_composite_get_failure_skips_set() {
    let transport = SpyTransport::default()
        .reply("getMotionDetectConfig", "<CGI_Result><result>-2</result></CGI_Result>")
        .reply("setMotionDetectConfig", OK);
    let client = CameraClient::with_transport(endpoint(), transport);

    assert_eq!(client.set_motion_detection(true).await, ResultCode::Auth);
    let urls = client_urls(&client);
    assert_eq!(urls.len(), 1);
    assert_eq!(command_of(&urls[0]).as_deref(), Some("getMotionDetectConfig"));
}

#[tokio::test]
async fn test_composite_unreachable_skips_set() {
    let client = CameraClient::with_transport(endpoint(), SpyTransport::default().reply("setMotionDetectConfig1", OK));

    assert_eq!(client.set_motion_detection1(false).await, ResultCode::Unavailable);
    assert_eq!(client_urls(&client).len(), 1);
}

#[tokio::test]
async fn test_update_config_missing_field_skips_set() {
    let transport = SpyTransport::default()
        .reply("getMotionDetectConfig1", "<CGI_Result><result>0</result><linkage>0</linkage></CGI_Result>")
        .reply("setMotionDetectConfig1", OK);
    let client = CameraClient::with_transport(endpoint(), transport);

    assert_eq!(client.set_motion_detection1(true).await, ResultCode::Format);
    assert_eq!(client_urls(&client).len(), 1);
}

#[tokio::test]
async fn test_modify_config_runs_synchronously_on_detached_endpoint() {
    let transport = SpyTransport::default()
        .reply("getSMTPConfig", "<CGI_Result><result>0</result><isEnable>1</isEnable><server>smtp.local</server><port>25</port></CGI_Result>")
        .reply("setSMTPConfig", OK);
    let client = CameraClient::with_transport(detached_endpoint(), transport);

    let code = client
        .modify_config(ConfigSection::Smtp, |fields| {
            fields.insert("port", Some("587".to_string()));
        })
        .await;
    assert_eq!(code, ResultCode::Success);

    let urls = client_urls(&client);
    assert_eq!(urls.len(), 2);
    assert!(urls[1].ends_with("&cmd=setSMTPConfig&isEnable=1&server=smtp.local&port=587"));
}

fn client_urls(client: &CameraClient<SpyTransport>) -> Vec<String> {
    client.transport().urls.lock().unwrap().clone()
}

#[tokio::test]
#[ignore]
async fn test_real_camera_dev_state() {
    let endpoint = Endpoint::new("192.168.1.20", 88, "admin", "").expect("Invalid endpoint");
    let client = CameraClient::new(endpoint).expect("Failed to build client");

    let result = client.execute("getDevState", Params::new()).await;
    println!("getDevState -> {} {:?}", result.code, result.fields());
    assert!(result.is_success(), "Expected camera to answer getDevState");
}
