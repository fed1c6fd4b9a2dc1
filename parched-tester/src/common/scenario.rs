//! Named scenarios runnable from the command line.
use anyhow::{Result, ensure};

use crate::logic::simulation::{Activity, Environment, SimulationPlan, SimulationSummary};

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub description: &'static str,
    pub plan: SimulationPlan,
}

const SCENARIOS: &[(&str, &str)] = &[
    ("smoke", "Short walk with water breaks and two connected clients"),
    ("idle", "Standing still in mild weather: the loss delay absorbs most thirst"),
    ("sprint", "Sprinting and fighting drains hydration far faster than idling"),
    ("desert", "Walking through desert heat without water until thirst kills"),
    ("oasis", "Desert walk with regular pure water keeps the player alive"),
    ("rot-water", "Drinking zero-purity water makes the player vomit every time"),
    ("salt-water", "Salt water removes hydration and raises the thirst rate"),
    ("thirst-disabled", "Admin disables thirst; drinks no longer hydrate"),
    ("config-sync", "Admin override and reload reach every client replica"),
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS.iter().copied()
}

#[must_use]
pub fn all_scenario_names() -> Vec<String> {
    SCENARIOS.iter().map(|(name, _)| (*name).to_string()).collect()
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let key = name.to_lowercase();
    let &(name, description) = SCENARIOS.iter().find(|(candidate, _)| *candidate == key)?;
    let plan = match name {
        "smoke" => smoke(),
        "idle" => idle(),
        "sprint" => sprint(),
        "desert" => desert(),
        "oasis" => oasis(),
        "rot-water" => rot_water(),
        "salt-water" => salt_water(),
        "thirst-disabled" => thirst_disabled(),
        "config-sync" => config_sync(),
        _ => return None,
    };
    Some(TestScenario {
        name: name.to_string(),
        description,
        plan,
    })
}

fn smoke() -> SimulationPlan {
    SimulationPlan::new(300)
        .with_activity(Activity::Walking)
        .with_drink("game:waterportion", 100, 0.5)
        .with_clients(2)
        .expect(|s| {
            ensure!(s.persisted, "final thirst tree was not persisted");
            ensure!(s.drinks_hydrated == 3, "expected 3 drinks, got {}", s.drinks_hydrated);
            ensure!(s.final_state.hydration > 0.0, "player dried out during a short walk");
            Ok(())
        })
        .expect(expect_replicas_in_sync)
}

fn idle() -> SimulationPlan {
    SimulationPlan::new(1200).expect(|s| {
        let hydration = s.final_state.hydration;
        ensure!(
            hydration < 1500.0 && hydration > 1000.0,
            "idle hydration {hydration:.1} outside (1000, 1500)"
        );
        ensure!(s.damage_taken <= 0.0, "idle player took {:.2} damage", s.damage_taken);
        Ok(())
    })
}

fn sprint() -> SimulationPlan {
    SimulationPlan::new(1200)
        .with_activity(Activity::Sprinting)
        .with_attacks(20)
        .expect(|s| {
            ensure!(s.attacks == 60, "expected 60 attacks, got {}", s.attacks);
            ensure!(
                s.final_state.hydration < 500.0,
                "sprinter still at {:.1} hydration",
                s.final_state.hydration
            );
            Ok(())
        })
}

fn desert() -> SimulationPlan {
    SimulationPlan::new(2400)
        .with_activity(Activity::Walking)
        .with_environment(Environment::DESERT)
        .expect(|s| {
            ensure!(s.min_hydration <= 0.0, "never ran dry (min {:.1})", s.min_hydration);
            ensure!(s.thirst_damage_events > 0, "dehydration never hurt");
            ensure!(s.revives >= 1, "player never died of thirst");
            ensure!(s.final_thirst_rate > 1.4, "heat did not raise thirst rate");
            Ok(())
        })
}

fn oasis() -> SimulationPlan {
    SimulationPlan::new(2400)
        .with_activity(Activity::Walking)
        .with_environment(Environment::DESERT)
        .with_drink("game:waterportion-pure", 120, 1.0)
        .expect(|s| {
            ensure!(s.drinks_hydrated == 20, "expected 20 drinks, got {}", s.drinks_hydrated);
            ensure!(s.thirst_damage_events == 0, "took thirst damage despite water");
            ensure!(s.min_hydration > 0.0, "ran dry despite water");
            Ok(())
        })
}

fn rot_water() -> SimulationPlan {
    SimulationPlan::new(605)
        .with_drink("game:waterportion-stagnant", 60, 1.0)
        .with_admin_override(|synced| synced.stagnant_purity_level = 0.0)
        .expect(|s| {
            ensure!(s.drinks_hydrated == 10, "expected 10 drinks, got {}", s.drinks_hydrated);
            ensure!(
                s.vomits == s.drinks_hydrated,
                "vomited {} times for {} drinks",
                s.vomits,
                s.drinks_hydrated
            );
            Ok(())
        })
}

fn salt_water() -> SimulationPlan {
    SimulationPlan::new(120)
        .with_drink("game:saltwaterportion", 50, 1.0)
        .expect(|s| {
            ensure!(s.hydration_applied < 0.0, "salt water hydrated ({:.1})", s.hydration_applied);
            ensure!(
                s.final_state.hydration < 400.0,
                "hydration {:.1} after two salt water drinks",
                s.final_state.hydration
            );
            Ok(())
        })
}

fn thirst_disabled() -> SimulationPlan {
    SimulationPlan::new(300)
        .with_drink("game:waterportion-pure", 100, 1.0)
        .with_admin_override(|synced| synced.enable_thirst = false)
        .expect(|s| {
            ensure!(s.drinks_ignored == 3, "expected 3 ignored drinks, got {}", s.drinks_ignored);
            ensure!(s.drinks_hydrated == 0, "disabled thirst still hydrated");
            Ok(())
        })
}

fn config_sync() -> SimulationPlan {
    SimulationPlan::new(60)
        .with_clients(4)
        .with_admin_override(|synced| synced.thirst_speed_modifier = 2.0)
        .with_reload_at(30)
        .expect(expect_replicas_in_sync)
        .expect(|s| {
            ensure!(s.clients_synced == 4, "only {} of 4 clients synced", s.clients_synced);
            ensure!(s.rejected_pushes == 1, "forged push was not rejected");
            ensure!(s.reloads == 1, "reload did not run");
            Ok(())
        })
}

fn expect_replicas_in_sync(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.replicas_in_sync, "client replicas diverged from the server");
    Ok(())
}
