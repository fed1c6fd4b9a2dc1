//! Hooks run by the host at consumption decision points.
//!
//! The host asks every registered [`ConsumptionHook`] before an eat or drink
//! action completes. A hook may let it proceed untouched, annotate it with the
//! hydration the item grants, or veto it.
use std::fmt::Write as _;

use crate::config::{ConfigClient, SyncedConfig};
use crate::host::EntityId;
use crate::hydration::HydrationProperties;
use crate::sync::ConfigEvent;
use crate::table::HydrationTable;

/// An eat or drink action about to complete.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsumptionEvent<'a> {
    pub entity: EntityId,
    pub item_code: &'a str,
    /// Litres drunk or fraction of the item eaten.
    pub portion: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsumptionDecision {
    Proceed,
    Annotate(HydrationProperties),
    Veto(String),
}

pub trait ConsumptionHook {
    fn before_consume(&self, event: &ConsumptionEvent<'_>) -> ConsumptionDecision;

    /// React to a config event; hooks caching tunables re-read them here.
    fn on_config_event(&mut self, _event: ConfigEvent, _synced: &SyncedConfig) {}
}

/// Annotates consumption with hydration resolved from the merged table.
#[derive(Debug, Clone)]
pub struct HydrationHook<'t> {
    table: &'t HydrationTable,
    enable_thirst: bool,
    container_drink_speed: f32,
}

impl<'t> HydrationHook<'t> {
    #[must_use]
    pub fn new(table: &'t HydrationTable, synced: &SyncedConfig) -> Self {
        let mut hook = Self {
            table,
            enable_thirst: true,
            container_drink_speed: 1.0,
        };
        hook.reconfigure(synced);
        hook
    }

    fn reconfigure(&mut self, synced: &SyncedConfig) {
        self.enable_thirst = synced.enable_thirst;
        self.container_drink_speed = synced.container_drink_speed;
    }

    /// Seconds a container drink takes once the configured speed is applied.
    #[must_use]
    pub fn drink_duration(&self, base_secs: f32) -> f32 {
        if self.container_drink_speed > 0.0 {
            base_secs / self.container_drink_speed
        } else {
            base_secs
        }
    }
}

impl ConsumptionHook for HydrationHook<'_> {
    fn before_consume(&self, event: &ConsumptionEvent<'_>) -> ConsumptionDecision {
        if !self.enable_thirst {
            return ConsumptionDecision::Proceed;
        }
        if !event.portion.is_finite() || event.portion <= 0.0 {
            return ConsumptionDecision::Veto(format!("nothing left of {}", event.item_code));
        }
        match self.table.resolve(event.item_code) {
            Some(props) => ConsumptionDecision::Annotate(props.scaled(event.portion)),
            None => ConsumptionDecision::Proceed,
        }
    }

    fn on_config_event(&mut self, event: ConfigEvent, synced: &SyncedConfig) {
        if event == ConfigEvent::Reloaded {
            self.reconfigure(synced);
        }
    }
}

/// Held-item description line, or `None` when hidden or not hydrating.
#[must_use]
pub fn describe_hydration(props: Option<&HydrationProperties>, client: &ConfigClient) -> Option<String> {
    if !client.show_hydration_info {
        return None;
    }
    let props = props?;
    let decimals = usize::from(client.hydration_info_decimals);
    let mut line = format!("Hydration: {:.*} ({})", decimals, props.hydration, props.purity);
    if props.salty {
        line.push_str(", salty");
    }
    if props.scalding {
        line.push_str(", scalding");
    }
    if props.hydration_loss_delay > 0.0 {
        let _ = write!(line, ", quenches for {:.0}s", props.hydration_loss_delay);
    }
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydration::HydrationEntry;
    use crate::purity::PurityLevel;
    use serde_json::json;

    fn table() -> HydrationTable {
        let entry = HydrationEntry::from_value(
            json!({
                "itemname": "game:waterportion-*",
                "hydrationByType": { "game:waterportion-pure": 1000, "*": 600 },
                "isLiquid": true,
                "hydrationLossDelay": 10
            }),
            2,
        )
        .unwrap();
        HydrationTable::from_entries([(entry.item_pattern.clone(), entry)].into_iter().collect())
    }

    fn event(item: &str, portion: f32) -> ConsumptionEvent<'_> {
        ConsumptionEvent {
            entity: EntityId(1),
            item_code: item,
            portion,
        }
    }

    #[test]
    fn annotates_scaled_hydration() {
        let table = table();
        let hook = HydrationHook::new(&table, &SyncedConfig::default());
        let decision = hook.before_consume(&event("game:waterportion-pure", 0.5));
        let ConsumptionDecision::Annotate(props) = decision else {
            panic!("expected annotation, got {decision:?}");
        };
        assert!((props.hydration - 500.0).abs() < f32::EPSILON);
        assert_eq!(props.purity, PurityLevel::Pure);
        assert_eq!(
            hook.before_consume(&event("game:bread-spelt", 1.0)),
            ConsumptionDecision::Proceed
        );
        assert!(matches!(
            hook.before_consume(&event("game:waterportion-pure", 0.0)),
            ConsumptionDecision::Veto(_)
        ));
    }

    #[test]
    fn disabled_thirst_leaves_consumption_alone_until_reloaded() {
        let table = table();
        let disabled = SyncedConfig {
            enable_thirst: false,
            container_drink_speed: 2.0,
            ..SyncedConfig::default()
        };
        let mut hook = HydrationHook::new(&table, &disabled);
        assert_eq!(
            hook.before_consume(&event("game:waterportion-pure", 1.0)),
            ConsumptionDecision::Proceed
        );
        assert!((hook.drink_duration(3.0) - 1.5).abs() < f32::EPSILON);

        hook.on_config_event(ConfigEvent::AdminSetConfig, &SyncedConfig::default());
        assert_eq!(
            hook.before_consume(&event("game:waterportion-pure", 1.0)),
            ConsumptionDecision::Proceed
        );
        hook.on_config_event(ConfigEvent::Reloaded, &SyncedConfig::default());
        assert!(matches!(
            hook.before_consume(&event("game:waterportion-pure", 1.0)),
            ConsumptionDecision::Annotate(_)
        ));
    }

    #[test]
    fn description_respects_client_preferences() {
        let mut props = HydrationProperties::new(600.0, PurityLevel::Okay).with_loss_delay(10.0);
        props.salty = true;
        let client = ConfigClient::default();
        assert_eq!(
            describe_hydration(Some(&props), &client).as_deref(),
            Some("Hydration: 600 (Okay), salty, quenches for 10s")
        );
        let precise = ConfigClient {
            hydration_info_decimals: 1,
            ..ConfigClient::default()
        };
        let plain = HydrationProperties::new(8.0, PurityLevel::Pure);
        assert_eq!(
            describe_hydration(Some(&plain), &precise).as_deref(),
            Some("Hydration: 8.0 (Pure)")
        );
        let hidden = ConfigClient {
            show_hydration_info: false,
            ..ConfigClient::default()
        };
        assert!(describe_hydration(Some(&props), &hidden).is_none());
        assert!(describe_hydration(None, &client).is_none());
    }
}
