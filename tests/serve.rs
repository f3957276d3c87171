use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use http::StatusCode;
use onion::middleware::{Middleware, Trace, from_fn};
use onion::{App, Chain, Error, Request, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

type Events = Arc<Mutex<Vec<(String, String)>>>;

/// Records `(request id, event)` pairs so interleaved requests can be told apart.
fn tagged(name: &'static str, events: Events) -> impl Middleware {
    from_fn(move |req: Request, next: Chain| {
        let events = Arc::clone(&events);
        async move {
            let id = req.header("x-request-id").unwrap_or("-").to_owned();
            events.lock().unwrap().push((id.clone(), format!("{name}-start")));
            tokio::task::yield_now().await;
            let res = next.call(req).await;
            events.lock().unwrap().push((id, format!("{name}-end")));
            res
        }
    })
}

fn tagged_app(base: App, events: &Events) -> App {
    let handler_events = Arc::clone(events);
    base.middleware(tagged("A", Arc::clone(events)))
        .middleware(tagged("B", Arc::clone(events)))
        .route("/", move |req: Request| {
            let events = Arc::clone(&handler_events);
            async move {
                let id = req.header("x-request-id").unwrap_or("-").to_owned();
                tokio::task::yield_now().await;
                events.lock().unwrap().push((id, "handler".to_owned()));
                "Hello, World!"
            }
        })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_keep_their_own_ordering() {
    const N: usize = 64;

    let events = Events::default();
    let app = Arc::new(tagged_app(App::new(), &events));

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..N {
        let app = Arc::clone(&app);
        tasks.spawn(async move {
            let req = http::Request::get("/")
                .header("x-request-id", i.to_string())
                .body("")
                .unwrap();
            app.call(Request::from(req)).await
        });
    }
    while let Some(res) = tasks.join_next().await {
        let res = res.unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"Hello, World!");
    }

    let mut per_request: HashMap<String, Vec<String>> = HashMap::new();
    for (id, event) in events.lock().unwrap().iter() {
        per_request.entry(id.clone()).or_default().push(event.clone());
    }

    assert_eq!(per_request.len(), N);
    for (id, seq) in per_request {
        assert_eq!(
            seq,
            ["A-start", "B-start", "handler", "B-end", "A-end"],
            "request {id}"
        );
    }
}

type Running = (SocketAddr, oneshot::Sender<()>, JoinHandle<Result<(), Error>>);

async fn start(app: App) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::from_listener(listener).serve_with_shutdown(app, async {
        let _ = rx.await;
    }));
    (addr, tx, server)
}

async fn raw_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let head = format!("GET {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\r\n");
    stream.write_all(head.as_bytes()).await.unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    out
}

#[tokio::test]
async fn hello_world_over_tcp() {
    let events = Events::default();
    let app = tagged_app(App::new().middleware(Trace), &events);
    let (addr, shutdown, server) = start(app).await;

    let res = raw_get(addr, "/").await;
    assert!(res.starts_with("HTTP/1.1 200 OK\r\n"), "{res}");
    assert!(res.ends_with("\r\n\r\nHello, World!"), "{res}");

    let res = raw_get(addr, "/missing").await;
    assert!(res.starts_with("HTTP/1.1 404 Not Found\r\n"), "{res}");

    shutdown.send(()).unwrap();
    server.await.unwrap().unwrap();

    let seq: Vec<String> = events.lock().unwrap().iter().map(|(_, e)| e.clone()).collect();
    assert_eq!(seq, ["A-start", "B-start", "handler", "B-end", "A-end"]);
}

#[tokio::test]
async fn bind_failure_is_reported() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap();

    let err = Server::bind(&addr.to_string())
        .serve_with_shutdown(App::new(), std::future::pending())
        .await
        .unwrap_err();

    match err {
        Error::Bind { addr: bound, .. } => assert_eq!(bound, addr.to_string()),
        other => panic!("unexpected error: {other}"),
    }
}
