use crate::echo;
use anyhow::{anyhow, bail, Context};
use bridge_client::{FacadeClient, LoopbackTransport};
use bridge_core::{FacadeDefinition, ResponseEnvelope, Role};
use bridge_dispatch::Dispatcher;
use bridge_schema::{render_facade_module, SchemaRegistry};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

pub fn check(registry: &SchemaRegistry) -> String {
    let methods: usize = registry.facades().map(|facade| facade.methods.len()).sum();
    format!(
        "ok: {} facades, {} methods, {} structs",
        registry.len(),
        methods,
        registry.structures().count()
    )
}

pub fn describe(
    registry: &SchemaRegistry,
    role: Option<&Role>,
    facade: Option<&str>,
) -> anyhow::Result<String> {
    let selected: Vec<&FacadeDefinition> = match facade {
        Some(name) => vec![registry
            .facade(name)
            .ok_or_else(|| anyhow!("unknown facade `{name}`"))?],
        None => registry
            .facades()
            .filter(|facade| role.map_or(true, |role| facade.can_send(role) || facade.can_receive(role)))
            .collect(),
    };

    let mut out = String::new();
    for facade in selected {
        let _ = writeln!(
            out,
            "{}  [{} -> {}]",
            facade.name,
            join_roles(facade.senders.iter()),
            join_roles(facade.receivers.iter())
        );
        if let Some(doc) = &facade.doc {
            let _ = writeln!(out, "  # {doc}");
        }
        for method in facade.methods.values() {
            let _ = writeln!(out, "  {}", method.signature());
        }
    }
    Ok(out)
}

fn join_roles<'a>(roles: impl Iterator<Item = &'a Role>) -> String {
    roles.map(Role::as_str).collect::<Vec<_>>().join(", ")
}

pub fn generate(registry: &SchemaRegistry, facade: &str) -> anyhow::Result<String> {
    let definition = registry
        .facade(facade)
        .ok_or_else(|| anyhow!("unknown facade `{facade}`"))?;
    Ok(render_facade_module(definition, registry))
}

/// Echo-backed dispatcher for every facade `role` receives.
pub fn echo_dispatcher(
    registry: Arc<SchemaRegistry>,
    role: Role,
    max_in_flight: usize,
) -> anyhow::Result<Arc<Dispatcher>> {
    let dispatcher = Dispatcher::new(registry.clone(), role.clone()).with_max_in_flight(max_in_flight);
    for facade in registry.facades_for_receiver(&role) {
        dispatcher
            .register_handler(&facade.name, Arc::new(echo::handler(facade)))
            .with_context(|| format!("register echo handler for {}", facade.name))?;
    }
    Ok(Arc::new(dispatcher))
}

/// Reads one request envelope per line and writes one response per line.
///
/// Requests run concurrently, so responses come back in completion order.
/// Lines that are not JSON, or carry no usable request id, are skipped with
/// a warning.
pub async fn dispatch_lines<R, W>(
    dispatcher: Arc<Dispatcher>,
    reader: R,
    writer: W,
) -> anyhow::Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (responses, mut outgoing) = mpsc::unbounded_channel::<ResponseEnvelope>();
    let printer = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(response) = outgoing.recv().await {
            let mut line = serde_json::to_string(&response)?;
            line.push('\n');
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
        }
        anyhow::Ok(writer)
    });

    let mut lines = reader.lines();
    let mut line_number = 0_usize;
    while let Some(line) = lines.next_line().await.context("read request line")? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = match serde_json::from_str(&line) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(line = line_number, "skipping invalid json: {err}");
                continue;
            }
        };

        let dispatcher = dispatcher.clone();
        let responses = responses.clone();
        tokio::spawn(async move {
            match dispatcher.dispatch_value(&value).await {
                Ok(response) => {
                    let _ = responses.send(response);
                }
                Err(err) => {
                    tracing::warn!(line = line_number, "skipping uncorrelatable request: {err}")
                }
            }
        });
    }

    drop(responses);
    printer.await.context("response writer task")?
}

/// One call from `sender` through a loopback connection to echo handlers.
pub async fn call(
    registry: Arc<SchemaRegistry>,
    sender: Role,
    facade: &str,
    method: &str,
    args: Vec<Value>,
    timeout: Duration,
) -> anyhow::Result<Value> {
    let definition = registry
        .facade(facade)
        .ok_or_else(|| anyhow!("unknown facade `{facade}`"))?;
    let Some(receiver) = definition.receivers.iter().next().cloned() else {
        bail!("facade `{facade}` has no receivers");
    };

    let dispatcher = echo_dispatcher(registry.clone(), receiver, 1)?;
    let (transport, responses) = LoopbackTransport::new(dispatcher);
    let client = Arc::new(FacadeClient::new(registry, sender, Arc::new(transport)).with_timeout(timeout));
    let listener = client.listen(responses);

    let result = client.call(facade, method, args).await;
    listener.abort();
    Ok(result?)
}
