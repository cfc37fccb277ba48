//! Invocation tests for the runtime plan backend.
//!
//! A recording requester stands in for the transport: it captures every
//! request description it receives and answers with canned responses.

#![allow(missing_docs)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use chela_core::{
    BodyStream, Method, RequestDescription, Requester, Response, ResponseMessage, Result,
    Serializers, Value,
};
use chela_gen::model::{
    HeaderAttr, MethodModel, ParameterAttr, ParameterModel, PathAttr, PropertyAttr, PropertyModel,
    RequestAttr, ReturnType, TypeModel, TypeRef,
};
use chela_gen::{Invoked, PlanEmitter, generate};
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingRequester {
    serializers: Serializers,
    seen: Mutex<Vec<RequestDescription>>,
    response: Mutex<Option<ResponseMessage>>,
    disposed: AtomicBool,
}

impl RecordingRequester {
    fn with_response(response: ResponseMessage) -> Self {
        Self {
            response: Mutex::new(Some(response)),
            ..Self::default()
        }
    }

    fn record(&self, description: RequestDescription) {
        self.seen.lock().expect("lock").push(description);
    }

    fn last(&self) -> RequestDescription {
        self.seen
            .lock()
            .expect("lock")
            .last()
            .expect("a request was recorded")
            .clone()
    }

    fn canned(&self) -> ResponseMessage {
        self.response
            .lock()
            .expect("lock")
            .clone()
            .unwrap_or_else(|| ResponseMessage::new(200, Vec::new(), Bytes::new()))
    }
}

impl Requester for RecordingRequester {
    fn serializers(&self) -> &Serializers {
        &self.serializers
    }

    async fn request_void(&self, description: RequestDescription) -> Result<()> {
        self.record(description);
        Ok(())
    }

    async fn request_json(&self, description: RequestDescription) -> Result<Value> {
        self.record(description);
        self.canned().json()
    }

    async fn request_response_message(
        &self,
        description: RequestDescription,
    ) -> Result<ResponseMessage> {
        self.record(description);
        Ok(self.canned())
    }

    async fn request_response(&self, description: RequestDescription) -> Result<Response<Value>> {
        self.record(description);
        let message = self.canned();
        let value = message.json()?;
        Ok(Response::new(value, message))
    }

    async fn request_raw_bytes(&self, description: RequestDescription) -> Result<Bytes> {
        self.record(description);
        Ok(self.canned().into_body())
    }

    async fn request_raw_string(&self, description: RequestDescription) -> Result<String> {
        self.record(description);
        let body = self.canned().into_body();
        String::from_utf8(body.to_vec()).map_err(|e| chela_core::Error::argument(e.to_string()))
    }

    async fn request_raw_stream(&self, description: RequestDescription) -> Result<BodyStream> {
        self.record(description);
        let body = self.canned().into_body();
        Ok(Box::pin(one_chunk_stream(body)))
    }

    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }
}

fn one_chunk_stream(chunk: Bytes) -> impl futures_core::Stream<Item = Result<Bytes>> + Send {
    struct Once(Option<Bytes>);
    impl futures_core::Stream for Once {
        type Item = Result<Bytes>;
        fn poll_next(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Option<Self::Item>> {
            std::task::Poll::Ready(self.get_mut().0.take().map(Ok))
        }
    }
    Once(Some(chunk))
}

fn get(path: &str) -> RequestAttr {
    RequestAttr::new(Method::Get, path)
}

#[tokio::test]
async fn invoke_void_records_description() {
    let model = TypeModel::new("Api").with_method(MethodModel::new(
        "ping",
        get("/ping"),
        ReturnType::FutureVoid,
    ));
    let plan = generate(&model, &PlanEmitter).into_result().expect("valid");

    let requester = RecordingRequester::default();
    let invoked = plan
        .method("ping")
        .expect("method plan")
        .invoke(&requester, &[], &[])
        .await
        .expect("invoke");
    assert!(matches!(invoked, Invoked::Void));

    let desc = requester.last();
    assert_eq!(desc.method(), Method::Get);
    assert_eq!(desc.path().as_str(), "/ping");
    assert_eq!(desc.method_name(), "ping");
}

#[tokio::test]
async fn invoke_json_deserializes_body() {
    let model = TypeModel::new("Api").with_method(MethodModel::new(
        "get_user",
        get("/users/1"),
        ReturnType::FutureJson(TypeRef::new("User")),
    ));
    let plan = generate(&model, &PlanEmitter).into_result().expect("valid");

    let requester = RecordingRequester::with_response(ResponseMessage::new(
        200,
        Vec::new(),
        Bytes::from(r#"{"id":1,"name":"Alice"}"#),
    ));
    let invoked = plan
        .method("get_user")
        .expect("method plan")
        .invoke(&requester, &[], &[])
        .await
        .expect("invoke");
    assert_eq!(
        invoked.json().expect("json"),
        json!({"id": 1, "name": "Alice"})
    );
}

#[tokio::test]
async fn invoke_flows_arguments_and_properties() {
    let model = TypeModel::new("Api")
        .with_header(HeaderAttr::with_value("X-Api", "v1"))
        .with_property(
            PropertyModel::new("tenant", TypeRef::new("String"))
                .with_attr(PropertyAttr::Path(PathAttr::new())),
        )
        .with_method(
            MethodModel::new(
                "list",
                get("/tenants/{tenant}/items/{id}"),
                ReturnType::FutureVoid,
            )
            .with_param(
                ParameterModel::new("id", TypeRef::new("u64"))
                    .with_attr(ParameterAttr::Path(PathAttr::new())),
            )
            .with_param(ParameterModel::new("page", TypeRef::new("u32"))),
        );
    let plan = generate(&model, &PlanEmitter).into_result().expect("valid");

    let requester = RecordingRequester::default();
    plan.method("list")
        .expect("method plan")
        .invoke(&requester, &[json!("acme")], &[json!(7).into(), json!(2).into()])
        .await
        .expect("invoke");

    let desc = requester.last();
    let url = desc
        .url(
            &url::Url::parse("https://api.example.com").expect("valid URL"),
            requester.serializers(),
        )
        .expect("url");
    assert_eq!(url.path(), "/tenants/acme/items/7");
    assert_eq!(url.query(), Some("page=2"));
    assert_eq!(
        desc.headers(),
        &[("X-Api".to_string(), "v1".to_string())]
    );
}

#[tokio::test]
async fn invoke_carries_cancellation_token() {
    let model = TypeModel::new("Api").with_method(
        MethodModel::new("slow", get("/slow"), ReturnType::FutureVoid)
            .with_param(ParameterModel::cancellation_token("token")),
    );
    let plan = generate(&model, &PlanEmitter).into_result().expect("valid");

    let token = CancellationToken::new();
    let requester = RecordingRequester::default();
    plan.method("slow")
        .expect("method plan")
        .invoke(&requester, &[], &[token.clone().into()])
        .await
        .expect("invoke");

    token.cancel();
    assert!(
        requester
            .last()
            .cancellation_token()
            .expect("token carried")
            .is_cancelled()
    );
}

#[tokio::test]
async fn invoke_response_message_passes_through() {
    let model = TypeModel::new("Api").with_method(MethodModel::new(
        "raw",
        get("/raw"),
        ReturnType::FutureResponseMessage,
    ));
    let plan = generate(&model, &PlanEmitter).into_result().expect("valid");

    let requester = RecordingRequester::with_response(ResponseMessage::new(
        418,
        vec![("X-Tea".to_string(), "pot".to_string())],
        Bytes::from("short and stout"),
    ));
    let invoked = plan
        .method("raw")
        .expect("method plan")
        .invoke(&requester, &[], &[])
        .await
        .expect("invoke");
    let message = invoked.response_message().expect("message");
    assert_eq!(message.status(), 418);
    assert_eq!(message.header("X-Tea"), Some("pot"));
}

#[tokio::test]
async fn dispose_delegates_to_requester() {
    let model = TypeModel::new("Api").with_method(MethodModel::dispose("close"));
    let plan = generate(&model, &PlanEmitter).into_result().expect("valid");

    let requester = RecordingRequester::default();
    assert_eq!(plan.dispose_method(), Some("close"));
    plan.dispose(&requester);
    assert!(requester.disposed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn plan_is_shareable_across_tasks() {
    let model = TypeModel::new("Api").with_method(MethodModel::new(
        "ping",
        get("/ping"),
        ReturnType::FutureVoid,
    ));
    let plan = std::sync::Arc::new(generate(&model, &PlanEmitter).into_result().expect("valid"));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let plan = std::sync::Arc::clone(&plan);
        handles.push(tokio::spawn(async move {
            let requester = RecordingRequester::default();
            plan.method("ping")
                .expect("method plan")
                .invoke(&requester, &[], &[])
                .await
                .expect("invoke");
        }));
    }
    for handle in handles {
        handle.await.expect("join");
    }
}
