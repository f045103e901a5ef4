use reqwest::Client;
use std::net::IpAddr;

/// One Google Analytics measurement-protocol event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub category: String,
    pub action: String,
    pub label: Option<String>,
    pub value: Option<usize>,
    pub client_ip: Option<IpAddr>,
}

/// Fire-and-forget event tracker. Without a tracking id every call is a
/// no-op.
#[derive(Debug, Clone)]
pub struct Analytics {
    http: Client,
    tracking_id: Option<String>,
    collect_url: String,
}

impl Analytics {
    pub fn new(http: Client, tracking_id: Option<String>, collect_url: impl Into<String>) -> Self {
        Self {
            http,
            tracking_id,
            collect_url: collect_url.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Client::new(), None, String::new())
    }

    pub fn is_enabled(&self) -> bool {
        self.tracking_id.is_some()
    }

    /// Form fields for one hit. `cid` is a fresh random id per hit.
    pub fn hit_params(tracking_id: &str, event: &Event) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("v", "1".to_string()),
            ("tid", tracking_id.to_string()),
            ("cid", nanoid::nanoid!()),
            ("t", "event".to_string()),
            ("ec", event.category.clone()),
            ("ea", event.action.clone()),
        ];
        if let Some(label) = &event.label {
            params.push(("el", label.clone()));
        }
        if let Some(value) = event.value {
            params.push(("ev", value.to_string()));
        }
        if let Some(ip) = event.client_ip {
            params.push(("uip", ip.to_string()));
        }
        params
    }

    /// Spawns the upload and returns immediately.
    pub fn track(&self, event: Event) {
        let Some(tracking_id) = self.tracking_id.clone() else {
            return;
        };
        let http = self.http.clone();
        let url = self.collect_url.clone();

        tokio::spawn(async move {
            let params = Self::hit_params(&tracking_id, &event);
            match http.post(&url).form(&params).send().await {
                Ok(res) if !res.status().is_success() => {
                    tracing::warn!(status = %res.status(), "analytics hit rejected");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "error sending analytics hit"),
            }
        });
    }
}
