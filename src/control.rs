//! Line-oriented JSON control protocol spoken by the `ansd` binary.
//!
//! Each input line is one object naming the calling `bundle` and an `op`:
//!
//! ```text
//! {"bundle":"com.example.app","op":"publish","request":{"id":1,"content":{...}}}
//! ```
//!
//! Each line is answered with `{"code":0,"data":...}` on success or
//! `{"code":<n>,"message":"..."}` on failure.

use crate::app::App;
use crate::bundles::BundleInfo;
use crate::client::NotificationClient;
use crate::core::{BundleOption, NotificationKey, NotificationRequest};
use crate::dnd::DoNotDisturbDate;
use crate::error::{NotificationError, Result};
use crate::slots::{NotificationSlot, SlotType};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    pub bundle: String,
    #[serde(flatten)]
    pub op: Operation,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Install {
        uid: i32,
        #[serde(default, alias = "systemApp")]
        system_app: bool,
    },
    Publish {
        request: NotificationRequest,
    },
    Cancel {
        id: i32,
        #[serde(default)]
        label: Option<String>,
    },
    CancelAll,
    Remove {
        hash_code: String,
    },
    RemoveByKey {
        option: BundleOption,
        key: NotificationKey,
    },
    RemoveAll {
        #[serde(default)]
        option: Option<BundleOption>,
    },
    GetActive,
    GetActiveCount,
    GetAllActive,
    AddSlot {
        slot: NotificationSlot,
    },
    GetSlots,
    RemoveSlot {
        slot_type: SlotType,
    },
    SetSlotByBundle {
        option: BundleOption,
        slot: NotificationSlot,
    },
    GetSlotsByBundle {
        option: BundleOption,
    },
    GetSlotNumByBundle {
        option: BundleOption,
    },
    SetDnd {
        date: DoNotDisturbDate,
    },
    GetDnd,
    SupportDnd,
    EnableNotification {
        option: BundleOption,
        enable: bool,
    },
    DisplayBadge {
        option: BundleOption,
        enable: bool,
    },
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ControlResponse {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ControlResponse {
    pub fn success(data: Value) -> Self {
        Self {
            code: 0,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(error: &NotificationError) -> Self {
        Self {
            code: error.code(),
            data: None,
            message: Some(error.to_string()),
        }
    }
}

fn to_data<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| NotificationError::Internal(e.to_string()))
}

/// Parses and executes one control line.
pub async fn handle_line(app: &App, line: &str) -> ControlResponse {
    let request: ControlRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Malformed control request");
            return ControlResponse::failure(&NotificationError::InvalidParam(format!(
                "malformed request: {}",
                e
            )));
        }
    };
    debug!(bundle = %request.bundle, op = ?request.op, "Control request");

    match execute(app, request).await {
        Ok(data) => ControlResponse::success(data),
        Err(e) => ControlResponse::failure(&e),
    }
}

async fn execute(app: &App, request: ControlRequest) -> Result<Value> {
    let ControlRequest { bundle, op } = request;
    match op {
        Operation::Install { uid, system_app } => {
            let info = BundleInfo {
                bundle,
                uid,
                system_app,
            };
            app.install(info.clone()).await?;
            to_data(info)
        }
        op => execute_as(&app.client(&bundle).await?, op).await,
    }
}

async fn execute_as(client: &NotificationClient, op: Operation) -> Result<Value> {
    match op {
        Operation::Install { .. } => Err(NotificationError::InvalidParam(
            "install is handled by the application".to_string(),
        )),
        Operation::Publish { request } => {
            let hash_code = client.publish(request).await?;
            to_data(serde_json::json!({ "hashCode": hash_code }))
        }
        Operation::Cancel { id, label } => to_data(client.cancel(id, label).await?),
        Operation::CancelAll => to_data(client.cancel_all().await?),
        Operation::Remove { hash_code } => to_data(client.remove(hash_code).await?),
        Operation::RemoveByKey { option, key } => to_data(client.remove_by_key(option, key).await?),
        Operation::RemoveAll { option } => to_data(client.remove_all(option).await?),
        Operation::GetActive => to_data(client.get_active_notifications().await?),
        Operation::GetActiveCount => to_data(client.get_active_notification_count().await?),
        Operation::GetAllActive => to_data(client.get_all_active_notifications().await?),
        Operation::AddSlot { slot } => to_data(client.add_slot(slot).await?),
        Operation::GetSlots => to_data(client.get_slots().await?),
        Operation::RemoveSlot { slot_type } => to_data(client.remove_slot(slot_type).await?),
        Operation::SetSlotByBundle { option, slot } => {
            to_data(client.set_slot_by_bundle(option, slot).await?)
        }
        Operation::GetSlotsByBundle { option } => to_data(client.get_slots_by_bundle(option).await?),
        Operation::GetSlotNumByBundle { option } => {
            to_data(client.get_slot_num_by_bundle(option).await?)
        }
        Operation::SetDnd { date } => to_data(client.set_do_not_disturb_date(date).await?),
        Operation::GetDnd => to_data(client.get_do_not_disturb_date().await?),
        Operation::SupportDnd => to_data(client.support_do_not_disturb_mode().await?),
        Operation::EnableNotification { option, enable } => {
            to_data(client.enable_notification(option, enable).await?)
        }
        Operation::DisplayBadge { option, enable } => {
            to_data(client.display_badge(option, enable).await?)
        }
    }
}

/// Answers control lines from `reader` on `writer` until the input closes or
/// shutdown is signalled.
pub async fn run<R, W>(app: &App, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut shutdown_rx = app.task_manager().get_shutdown_rx();
    info!("Control loop started.");

    loop {
        tokio::select! {
            Ok(_) = shutdown_rx.wait_for(|stop| *stop) => {
                info!("Control loop received shutdown signal.");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read control input")? else {
                    info!("Control input closed.");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let response = handle_line(app, &line).await;
                let mut encoded = serde_json::to_string(&response)?;
                encoded.push('\n');
                writer.write_all(encoded.as_bytes()).await?;
                writer.flush().await?;
            }
        }
    }
    Ok(())
}
