//! Test calls against the supervised print server.
//!
//! A call is fire-and-log: every outcome, including transport failure, comes
//! back as a [`CallOutcome`] value. Any HTTP status counts as a response;
//! only failures to get one at all are [`CallOutcome::Failed`].

use std::time::Duration;

use serde_json::{Map, Value};

use printmon_core::{ClientSettings, Endpoint, LogEntry, LogSink, PrintParams};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Responded {
        url: String,
        status: u16,
        body: String,
    },
    Failed {
        url: String,
        cause: String,
    },
}

impl CallOutcome {
    pub fn url(&self) -> &str {
        match self {
            CallOutcome::Responded { url, .. } | CallOutcome::Failed { url, .. } => url,
        }
    }

    pub fn is_responded(&self) -> bool {
        matches!(self, CallOutcome::Responded { .. })
    }

    /// The single log entry describing this outcome.
    pub fn to_entry(&self) -> LogEntry {
        match self {
            CallOutcome::Responded { status, body, .. } => {
                LogEntry::info(format!("Response: {status} {body}"))
            }
            CallOutcome::Failed { url, cause } => {
                LogEntry::error(format!("Failed to call {url}: {cause}"))
            }
        }
    }
}

/// Blocking HTTP client bound to one print server.
#[derive(Clone)]
pub struct PrintClient {
    agent: ureq::Agent,
    base_url: String,
    timeout: Duration,
}

impl PrintClient {
    pub fn new(settings: &ClientSettings) -> Self {
        Self::with_timeout(&settings.base_url, settings.timeout())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Issue one GET. Never panics or errors; failures are values.
    pub fn call(&self, endpoint: Endpoint, params: &PrintParams) -> CallOutcome {
        let url = self.url_for(endpoint);
        let mut request = self.agent.get(&url);
        for (key, value) in params.query_pairs(endpoint) {
            request = request.query(key, value);
        }

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                tracing::debug!(%url, error = %transport, "print test call failed");
                return CallOutcome::Failed {
                    url,
                    cause: transport.to_string(),
                };
            }
        };

        let status = response.status();
        match response.into_string() {
            Ok(body) => {
                tracing::debug!(%url, status, "print test call answered");
                CallOutcome::Responded { url, status, body }
            }
            Err(err) => CallOutcome::Failed {
                url,
                cause: format!("status {status} but body unreadable: {err}"),
            },
        }
    }

    /// Announce, call, and report to `sink` the way the operator panel shows it.
    pub fn invoke(
        &self,
        endpoint: Endpoint,
        params: &PrintParams,
        sink: &dyn LogSink,
    ) -> CallOutcome {
        let url = self.url_for(endpoint);
        sink.info(&format!("Calling endpoint: {url}"));
        sink.info(&format!("Parameters: {}", describe_params(params, endpoint)));

        let outcome = self.call(endpoint, params);
        sink.append(outcome.to_entry());
        outcome
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Parameters as a JSON object, as sent for `endpoint`.
pub fn describe_params(params: &PrintParams, endpoint: Endpoint) -> String {
    let object: Map<String, Value> = params
        .query_pairs(endpoint)
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
        .collect();
    Value::Object(object).to_string()
}
