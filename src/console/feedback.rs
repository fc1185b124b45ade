//! Startup registration of feedback subscriptions.

use tracing::{info, warn};

use super::error::ConsoleError;
use super::operator::Operator;
use crate::mqtt::topics::{Role, TopicRegistry};
use crate::mqtt::transport::{Transport, TransportError};

/// Which patterns were accepted by the broker client and which were not.
#[derive(Debug, Default)]
pub struct SubscriptionReport {
    pub registered: Vec<String>,
    pub failed: Vec<TransportError>,
}

/// Holds the ordered, fixed set of feedback patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackSubscriber {
    patterns: Vec<String>,
}

impl FeedbackSubscriber {
    pub fn new(patterns: Vec<String>) -> Self {
        FeedbackSubscriber { patterns }
    }

    /// Routed names of `roles` first, then the literal `topics`, each in the
    /// order given.
    pub fn from_roles(registry: &TopicRegistry, roles: &[Role], topics: &[String]) -> Self {
        let patterns = roles
            .iter()
            .map(|role| registry.routed_name(*role).to_string())
            .chain(topics.iter().cloned())
            .collect();
        FeedbackSubscriber { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Subscribes to every pattern in order. A failing pattern is logged and
    /// reported to the operator but does not stop the rest.
    pub async fn subscribe_all<O, T>(
        &self,
        operator: &mut O,
        transport: &T,
    ) -> Result<SubscriptionReport, ConsoleError>
    where
        O: Operator + ?Sized,
        T: Transport + ?Sized,
    {
        let mut report = SubscriptionReport::default();

        for pattern in &self.patterns {
            match transport.subscribe(pattern).await {
                Ok(()) => {
                    info!("Subscribed to {}", pattern);
                    report.registered.push(pattern.clone());
                }
                Err(e) => {
                    warn!("{}", e);
                    operator.show(&format!("Transport error: {}", e)).await?;
                    report.failed.push(e);
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::{Call, RecordingTransport, ScriptedOperator};

    #[tokio::test]
    async fn test_subscribes_in_order() {
        let subscriber = FeedbackSubscriber::new(vec![
            "bike/000001/speed".to_string(),
            "bike/000001/cadence".to_string(),
        ]);
        let transport = RecordingTransport::default();
        let mut operator = ScriptedOperator::new(Vec::<&str>::new());

        let report = subscriber
            .subscribe_all(&mut operator, &transport)
            .await
            .unwrap();

        assert_eq!(
            transport.calls(),
            vec![
                Call::Subscribe("bike/000001/speed".to_string()),
                Call::Subscribe("bike/000001/cadence".to_string()),
            ]
        );
        assert_eq!(report.registered.len(), 2);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_empty_set_is_a_no_op() {
        let transport = RecordingTransport::default();
        let mut operator = ScriptedOperator::new(Vec::<&str>::new());

        let report = FeedbackSubscriber::default()
            .subscribe_all(&mut operator, &transport)
            .await
            .unwrap();

        assert!(transport.calls().is_empty());
        assert!(report.registered.is_empty());
        assert!(operator.shown.is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_remaining_patterns() {
        let subscriber = FeedbackSubscriber::new(vec![
            "bike/000001/speed".to_string(),
            "bike/000001/power".to_string(),
            "bike/000001/cadence".to_string(),
        ]);
        let transport = RecordingTransport::failing_on(["bike/000001/power"]);
        let mut operator = ScriptedOperator::new(Vec::<&str>::new());

        let report = subscriber
            .subscribe_all(&mut operator, &transport)
            .await
            .unwrap();

        assert_eq!(transport.calls().len(), 3);
        assert_eq!(
            report.registered,
            vec!["bike/000001/speed", "bike/000001/cadence"]
        );
        assert_eq!(report.failed.len(), 1);
        assert!(operator.shown[0].contains("bike/000001/power"));
    }

    #[test]
    fn test_roles_resolve_before_literal_topics() {
        let registry = TopicRegistry::new("000001");
        let subscriber = FeedbackSubscriber::from_roles(
            &registry,
            &[Role::Speed, Role::ButtonReport],
            &["#".to_string()],
        );

        assert_eq!(
            subscriber.patterns(),
            ["bike/000001/speed", "bike/000001/button/report", "#"]
        );
    }
}
