//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use lamina_build::{ReloadSink, Stage};

/// Messages sent to connected browsers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReloadMessage {
    /// A build stage finished; the page should refresh
    Reload {
        /// Name of the stage that completed
        stage: String,
    },

    /// Connection established
    Connected,
}

/// Hub broadcasting reload messages to every connected client.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    sender: broadcast::Sender<ReloadMessage>,
}

impl ReloadHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: ReloadMessage) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(msg);
    }

    /// Subscribe to reload messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadSink for ReloadHub {
    fn notify(&self, stage: Stage) {
        self.send(ReloadMessage::Reload {
            stage: stage.name().to_string(),
        });
    }
}

/// Markup the builder appends to rendered pages in dev mode.
pub fn reload_snippet() -> String {
    r#"<script src="/__reload.js"></script>"#.to_string()
}

/// Client script served at `/__reload.js`.
pub fn reload_client_script() -> String {
    r#"
(function() {
  'use strict';

  const ws = new WebSocket('ws://' + location.host + '/__reload');
  let reconnectAttempts = 0;
  const maxReconnectAttempts = 10;

  ws.onopen = function() {
    console.log('[reload] connected');
    reconnectAttempts = 0;
  };

  ws.onmessage = function(event) {
    const msg = JSON.parse(event.data);

    switch (msg.type) {
      case 'reload':
        console.log('[reload] ' + msg.stage + ' rebuilt');
        location.reload();
        break;

      case 'connected':
        console.log('[reload] server acknowledged connection');
        break;
    }
  };

  ws.onclose = function() {
    console.log('[reload] disconnected');
    if (reconnectAttempts < maxReconnectAttempts) {
      reconnectAttempts++;
      setTimeout(function() {
        console.log('[reload] reconnecting...');
        location.reload();
      }, 1000 * reconnectAttempts);
    }
  };
})();
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_broadcasts_messages() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.send(ReloadMessage::Reload {
            stage: "pages".to_string(),
        });

        match rx.try_recv() {
            Ok(ReloadMessage::Reload { stage }) => assert_eq!(stage, "pages"),
            _ => panic!("Expected Reload message"),
        }
    }

    #[test]
    fn sink_notifications_carry_the_stage_name() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();

        hub.notify(Stage::Styles);

        match rx.try_recv() {
            Ok(ReloadMessage::Reload { stage }) => assert_eq!(stage, "styles"),
            _ => panic!("Expected Reload message"),
        }
    }

    #[test]
    fn serializes_messages() {
        let msg = ReloadMessage::Reload {
            stage: "scripts".to_string(),
        };

        let json = serde_json::to_string(&msg).unwrap();

        assert!(json.contains("reload"));
        assert!(json.contains("scripts"));
    }

    #[test]
    fn client_script_targets_the_reload_endpoint() {
        let script = reload_client_script();

        assert!(script.contains("/__reload"));
        assert!(script.contains("location.reload()"));
    }
}
