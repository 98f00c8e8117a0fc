//! Authoritative game state and the fixed-rate tick loop

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::util::time::{tick_delta, unix_millis, SIMULATION_TPS, TICK_DURATION_MICROS};
use crate::ws::protocol::{ClassKind, ClientMsg, EntityInfo, ServerMsg};

use super::classes::{self, ClassStats};
use super::combat::{
    self, AbilityEffect, DamageEvent, Projectile, BEAM_HALF_ANGLE, MAX_LIVE_PROJECTILES,
    PROJECTILE_MUZZLE_GAP,
};
use super::entity::{ActionSlot, EffectKind, Entity, SHIELD_ABSORB};
use super::physics::{self, Aabb};
use super::snapshot;
use super::world::World;
use super::{GameCmd, IntentState};

/// Experience awarded for a killing blow
const XP_PER_KILL: u32 = 25;
/// Delay between death and respawn, milliseconds
const RESPAWN_DELAY_MS: u64 = 3_000;
/// Idle eviction runs every this many ticks
const IDLE_SWEEP_TICKS: u64 = 100;
/// Display names longer than this are truncated
const MAX_NAME_CHARS: usize = 20;

/// A connected session as seen by the simulation loop
struct Session {
    /// Per-connection send queue; the loop never blocks on it
    outbound: mpsc::UnboundedSender<ServerMsg>,
    /// The session's live entity, if it has spawned
    entity_id: Option<Uuid>,
    /// Latest intent, superseded by each new input message
    intent: IntentState,
}

/// All simulation state, owned exclusively by the loop task.
/// Mutation happens only inside a tick or while applying queued commands.
pub struct GameState {
    world: World,
    entities: BTreeMap<Uuid, Entity>,
    projectiles: Vec<Projectile>,
    sessions: HashMap<Uuid, Session>,
    rng: ChaCha8Rng,
    tick: u64,
    max_players: usize,
    idle_timeout_ms: u64,
}

impl GameState {
    pub fn new(world: World, seed: u64, max_players: usize, idle_timeout_ms: u64) -> Self {
        Self {
            world,
            entities: BTreeMap::new(),
            projectiles: Vec::new(),
            sessions: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
            max_players,
            idle_timeout_ms,
        }
    }

    /// Apply one queued session command
    pub fn apply(&mut self, cmd: GameCmd) {
        match cmd {
            GameCmd::Connect {
                session_id,
                outbound,
            } => self.connect(session_id, outbound),
            GameCmd::Message {
                session_id,
                msg,
                received_at,
            } => self.handle_msg(session_id, msg, received_at),
            GameCmd::Disconnect { session_id } => self.remove_session(session_id, "disconnected"),
        }
    }

    /// Register a new session and send it the world layout.
    /// A connection arriving at the live-entity cap is told the server is
    /// full and never registered; dropping its sender closes the socket.
    fn connect(&mut self, session_id: Uuid, outbound: mpsc::UnboundedSender<ServerMsg>) {
        if self.entities.len() >= self.max_players {
            warn!(session_id = %session_id, "Connection rejected, arena at capacity");
            let _ = outbound.send(ServerMsg::ServerFull);
            return;
        }

        let _ = outbound.send(self.world_info());
        self.sessions.insert(
            session_id,
            Session {
                outbound,
                entity_id: None,
                intent: IntentState::default(),
            },
        );
        info!(session_id = %session_id, "Session connected");
    }

    fn handle_msg(&mut self, session_id: Uuid, msg: ClientMsg, now: u64) {
        match msg {
            ClientMsg::Spawn { class, name } => self.handle_spawn(session_id, class, name, now),
            ClientMsg::Input {
                move_x,
                move_y,
                facing: _,
                attack,
                q,
                e,
                x,
            } => {
                let Some(session) = self.sessions.get_mut(&session_id) else {
                    return;
                };
                session.intent = IntentState {
                    move_x,
                    move_y,
                    attack,
                    q,
                    e,
                    x,
                };
                if let Some(entity_id) = session.entity_id {
                    if let Some(entity) = self.entities.get_mut(&entity_id) {
                        entity.last_input_at = now;
                    }
                }
            }
            ClientMsg::Ping { t } => self.send_to(session_id, ServerMsg::Pong { t }),
        }
    }

    /// Create the session's entity. Idempotent: a second spawn request for
    /// an already-live entity does nothing.
    fn handle_spawn(&mut self, session_id: Uuid, class: ClassKind, name: String, now: u64) {
        let Some(session) = self.sessions.get(&session_id) else {
            return;
        };
        if session.entity_id.is_some() {
            debug!(session_id = %session_id, "Spawn ignored, entity already live");
            return;
        }
        if self.entities.len() >= self.max_players {
            warn!(session_id = %session_id, "Spawn rejected, arena at capacity");
            self.send_to(session_id, ServerMsg::ServerFull);
            self.remove_session(session_id, "server full");
            return;
        }

        let id = Uuid::new_v4();
        let name = sanitize_name(&name, id);
        let stats = ClassStats::for_class(class);
        let (x, y) = self.world.find_spawn(&mut self.rng, stats.box_w, stats.box_h);
        let entity = Entity::new(id, session_id, name, class, x, y, now);

        let joined = ServerMsg::EntityJoined {
            entity: entity_info(&entity),
        };
        self.entities.insert(id, entity);
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.entity_id = Some(id);
        }

        self.broadcast(joined);
        let init = ServerMsg::Init {
            entity_id: id,
            entities: self.entities.values().map(entity_info).collect(),
        };
        self.send_to(session_id, init);

        info!(
            session_id = %session_id,
            entity_id = %id,
            class = ?class,
            entity_count = self.entities.len(),
            "Entity spawned"
        );
    }

    /// Remove a session and its entity. Dropping the outbound sender ends
    /// the connection's writer task, which closes the socket.
    fn remove_session(&mut self, session_id: Uuid, reason: &str) {
        let Some(session) = self.sessions.remove(&session_id) else {
            return;
        };
        if let Some(entity_id) = session.entity_id {
            if self.entities.remove(&entity_id).is_some() {
                info!(
                    session_id = %session_id,
                    entity_id = %entity_id,
                    reason,
                    "Entity left"
                );
                self.broadcast(ServerMsg::EntityLeft { entity_id });
            }
        }
    }

    /// Run one simulation tick: resolve intents and abilities, integrate
    /// movement and projectiles, apply damage and lifecycle transitions,
    /// then broadcast the snapshot.
    pub fn run_tick(&mut self, now: u64) {
        self.tick += 1;

        let mut damage: Vec<DamageEvent> = Vec::new();
        self.resolve_intents(now, &mut damage);
        self.integrate(now, &mut damage);
        self.apply_damage(damage, now);
        self.respawn_due(now);
        if self.tick % IDLE_SWEEP_TICKS == 0 {
            self.evict_idle(now);
        }

        self.broadcast(snapshot::build_snapshot(
            now,
            &self.entities,
            &self.projectiles,
        ));
    }

    /// Turn each session's latest intent into velocity, facing and ability
    /// activations. Cooldowns are armed on activation, before the ability
    /// resolves, so a slot cannot re-trigger until its recharge elapses.
    fn resolve_intents(&mut self, now: u64, damage: &mut Vec<DamageEvent>) {
        let ids: Vec<Uuid> = self.entities.keys().copied().collect();
        for id in ids {
            let intent = {
                let Some(entity) = self.entities.get(&id) else {
                    continue;
                };
                if !entity.alive {
                    continue;
                }
                match self.sessions.get(&entity.session_id) {
                    Some(session) => session.intent,
                    None => continue,
                }
            };

            let class = match self.entities.get_mut(&id) {
                Some(entity) => {
                    let (vx, vy) = physics::velocity_from_axes(
                        intent.move_x,
                        intent.move_y,
                        entity.effective_speed(),
                    );
                    entity.vel_x = vx;
                    entity.vel_y = vy;
                    if let Some(facing) = physics::facing_from_axes(intent.move_x, intent.move_y) {
                        entity.facing = facing;
                    }
                    entity.class
                }
                None => continue,
            };

            for slot in ActionSlot::ALL {
                if !intent.wants(slot) {
                    continue;
                }
                let spec = classes::ability(class, slot);
                let armed = match self.entities.get_mut(&id) {
                    Some(entity) if entity.alive && entity.cooldowns[slot.index()] <= 0.0 => {
                        entity.cooldowns[slot.index()] = spec.cooldown;
                        true
                    }
                    _ => false,
                };
                if armed {
                    self.perform(id, spec.effect, now, damage);
                }
            }
        }
    }

    /// Interpret one ability behavior descriptor for an actor
    fn perform(
        &mut self,
        actor_id: Uuid,
        effect: AbilityEffect,
        now: u64,
        damage: &mut Vec<DamageEvent>,
    ) {
        let Some(actor) = self.entities.get(&actor_id) else {
            return;
        };
        let (ax, ay) = (actor.x, actor.y);
        let (half_w, half_h) = (actor.w * 0.5, actor.h * 0.5);
        let muzzle_gap = half_w + PROJECTILE_MUZZLE_GAP;
        let (dmg_add, dmg_mult) = actor.damage_mods();
        let facing_angle = physics::facing_angle(actor.facing);
        let scaled = |base: f32| (base + dmg_add) * dmg_mult;

        match effect {
            AbilityEffect::MeleeArc {
                radius,
                half_angle,
                damage: base,
            } => {
                let amount = scaled(base);
                for target in
                    combat::arc_targets(&self.entities, actor_id, ax, ay, facing_angle, radius, half_angle)
                {
                    damage.push(DamageEvent {
                        target,
                        source: actor_id,
                        amount,
                    });
                }
            }
            AbilityEffect::Nova { radius, damage: base } => {
                let amount = scaled(base);
                for target in combat::nova_targets(&self.entities, actor_id, ax, ay, radius) {
                    damage.push(DamageEvent {
                        target,
                        source: actor_id,
                        amount,
                    });
                }
            }
            AbilityEffect::Beam { range, damage: base } => {
                let amount = scaled(base);
                for target in combat::arc_targets(
                    &self.entities,
                    actor_id,
                    ax,
                    ay,
                    facing_angle,
                    range,
                    BEAM_HALF_ANGLE,
                ) {
                    damage.push(DamageEvent {
                        target,
                        source: actor_id,
                        amount,
                    });
                }
            }
            AbilityEffect::Shot {
                kind,
                count,
                spread,
                speed,
                damage: base,
                life,
            } => {
                let amount = scaled(base);
                for offset in combat::fan_angles(count, spread) {
                    // spawn requests beyond the live cap are dropped
                    if self.projectiles.len() >= MAX_LIVE_PROJECTILES {
                        break;
                    }
                    let angle = facing_angle + offset;
                    self.projectiles.push(Projectile::new(
                        actor_id,
                        kind,
                        ax + angle.cos() * muzzle_gap,
                        ay + angle.sin() * muzzle_gap,
                        angle,
                        speed,
                        amount,
                        life,
                    ));
                }
            }
            AbilityEffect::Seeker {
                kind,
                speed,
                damage: base,
                life,
            } => {
                if self.projectiles.len() >= MAX_LIVE_PROJECTILES {
                    return;
                }
                let angle = match combat::nearest_target(&self.entities, actor_id, ax, ay) {
                    Some((tx, ty)) => (ty - ay).atan2(tx - ax),
                    None => facing_angle,
                };
                self.projectiles.push(Projectile::new(
                    actor_id,
                    kind,
                    ax + angle.cos() * muzzle_gap,
                    ay + angle.sin() * muzzle_gap,
                    angle,
                    speed,
                    scaled(base),
                    life,
                ));
            }
            AbilityEffect::Heal { amount, radius } => match radius {
                None => {
                    if let Some(entity) = self.entities.get_mut(&actor_id) {
                        entity.heal(amount);
                    }
                }
                Some(radius) => {
                    for target in combat::heal_targets(&self.entities, ax, ay, radius) {
                        if let Some(entity) = self.entities.get_mut(&target) {
                            entity.heal(amount);
                        }
                    }
                }
            },
            AbilityEffect::Buff { kind, duration_ms } => {
                if let Some(entity) = self.entities.get_mut(&actor_id) {
                    entity.apply_effect(kind, now + duration_ms);
                }
            }
            AbilityEffect::Dash { distance, pulse } => {
                // teleport along facing, clamped to bounds; no obstacle check
                let (nx, ny) = physics::clamp_to_bounds(
                    ax + facing_angle.cos() * distance,
                    ay + facing_angle.sin() * distance,
                    half_w,
                    half_h,
                    self.world.px_width(),
                    self.world.px_height(),
                );
                if let Some(entity) = self.entities.get_mut(&actor_id) {
                    entity.x = nx;
                    entity.y = ny;
                }
                if let Some(pulse) = pulse {
                    let amount = scaled(pulse.damage);
                    for target in
                        combat::nova_targets(&self.entities, actor_id, nx, ny, pulse.radius)
                    {
                        damage.push(DamageEvent {
                            target,
                            source: actor_id,
                            amount,
                        });
                    }
                }
            }
        }
    }

    /// Advance entities and projectiles by one tick, decrement cooldowns,
    /// expire status effects. Entity moves are all-or-nothing against
    /// obstacles; projectiles resolve first-hit against non-owner entities.
    fn integrate(&mut self, now: u64, damage: &mut Vec<DamageEvent>) {
        let dt = tick_delta();
        let map_w = self.world.px_width();
        let map_h = self.world.px_height();

        for entity in self.entities.values_mut() {
            for cd in entity.cooldowns.iter_mut() {
                *cd = (*cd - dt).max(0.0);
            }
            entity.expire_effects(now);

            if !entity.alive || (entity.vel_x == 0.0 && entity.vel_y == 0.0) {
                continue;
            }
            let (cx, cy) = physics::clamp_to_bounds(
                entity.x + entity.vel_x * dt,
                entity.y + entity.vel_y * dt,
                entity.w * 0.5,
                entity.h * 0.5,
                map_w,
                map_h,
            );
            // blocked moves leave the entity in place for this tick
            if !self.world.blocked(&Aabb::from_center(cx, cy, entity.w, entity.h)) {
                entity.x = cx;
                entity.y = cy;
            }
        }

        let mut expired: Vec<usize> = Vec::new();
        for (idx, projectile) in self.projectiles.iter_mut().enumerate() {
            projectile.x += projectile.vel_x * dt;
            projectile.y += projectile.vel_y * dt;
            projectile.life -= dt;

            let out_of_bounds = projectile.x < 0.0
                || projectile.y < 0.0
                || projectile.x > map_w
                || projectile.y > map_h;
            if projectile.life <= 0.0 || out_of_bounds {
                expired.push(idx);
                continue;
            }

            for (target_id, target) in self.entities.iter() {
                if *target_id == projectile.owner || !target.alive {
                    continue;
                }
                if projectile.hits(&target.collider()) {
                    damage.push(DamageEvent {
                        target: *target_id,
                        source: projectile.owner,
                        amount: projectile.damage,
                    });
                    expired.push(idx);
                    break; // first hit wins, no multi-hit
                }
            }
        }
        for idx in expired.into_iter().rev() {
            self.projectiles.remove(idx);
        }
    }

    /// Apply queued damage in order, then handle deaths: xp to the killer,
    /// death notification, respawn scheduling. Damage to entities already
    /// dead this tick is discarded.
    fn apply_damage(&mut self, events: Vec<DamageEvent>, now: u64) {
        for event in events {
            let (session_id, amount, died) = {
                let Some(target) = self.entities.get_mut(&event.target) else {
                    continue;
                };
                if !target.alive {
                    continue;
                }
                let amount = if target.has_effect(EffectKind::Shield) {
                    event.amount * SHIELD_ABSORB
                } else {
                    event.amount
                };
                target.hp -= amount;
                let died = target.hp <= 0.0;
                if died {
                    target.hp = 0.0;
                    target.alive = false;
                    target.vel_x = 0.0;
                    target.vel_y = 0.0;
                    target.respawn_at = now + RESPAWN_DELAY_MS;
                }
                (target.session_id, amount, died)
            };

            self.send_to(
                session_id,
                ServerMsg::Hit {
                    amount,
                    source: event.source,
                },
            );

            if died {
                info!(entity_id = %event.target, source = %event.source, "Entity died");
                self.send_to(session_id, ServerMsg::Died { source: event.source });

                if event.source != event.target {
                    if let Some(killer) = self.entities.get_mut(&event.source) {
                        if killer.alive {
                            killer.grant_xp(XP_PER_KILL);
                        }
                    }
                }
            }
        }
    }

    /// Bring dead entities back once their respawn delay has elapsed
    fn respawn_due(&mut self, now: u64) {
        let due: Vec<(Uuid, f32, f32)> = self
            .entities
            .values()
            .filter(|e| !e.alive && e.respawn_at <= now)
            .map(|e| (e.id, e.w, e.h))
            .collect();

        for (id, w, h) in due {
            let (x, y) = self.world.find_spawn(&mut self.rng, w, h);
            let hp = match self.entities.get_mut(&id) {
                Some(entity) => {
                    entity.x = x;
                    entity.y = y;
                    entity.hp = entity.max_hp;
                    entity.alive = true;
                    entity.effects.clear();
                    entity.vel_x = 0.0;
                    entity.vel_y = 0.0;
                    entity.hp
                }
                None => continue,
            };
            info!(entity_id = %id, "Entity respawned");
            self.broadcast(ServerMsg::Respawned {
                entity_id: id,
                x,
                y,
                hp,
            });
        }
    }

    /// Evict sessions whose entity has been silent past the idle window,
    /// identically to an explicit disconnect
    fn evict_idle(&mut self, now: u64) {
        let stale: Vec<Uuid> = self
            .entities
            .values()
            .filter(|e| now.saturating_sub(e.last_input_at) > self.idle_timeout_ms)
            .map(|e| e.session_id)
            .collect();
        for session_id in stale {
            warn!(session_id = %session_id, "Evicting idle session");
            self.remove_session(session_id, "idle timeout");
        }
    }

    fn world_info(&self) -> ServerMsg {
        ServerMsg::WorldInfo {
            width: self.world.width,
            height: self.world.height,
            tile_size: self.world.tile_size,
            obstacles: self.world.obstacles.clone(),
            decorations: self.world.decorations.clone(),
        }
    }

    /// Fire-and-forget send to one session
    fn send_to(&self, session_id: Uuid, msg: ServerMsg) {
        if let Some(session) = self.sessions.get(&session_id) {
            let _ = session.outbound.send(msg);
        }
    }

    /// Fire-and-forget send to every session, unconditional and total
    fn broadcast(&self, msg: ServerMsg) {
        for session in self.sessions.values() {
            let _ = session.outbound.send(msg.clone());
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

fn entity_info(entity: &Entity) -> EntityInfo {
    EntityInfo {
        id: entity.id,
        name: entity.name.clone(),
        class: entity.class,
        x: entity.x,
        y: entity.y,
        hp: entity.hp,
        max_hp: entity.max_hp,
        level: entity.level,
    }
}

fn sanitize_name(raw: &str, entity_id: Uuid) -> String {
    let trimmed: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    if trimmed.is_empty() {
        format!("Player_{}", &entity_id.to_string()[..8])
    } else {
        trimmed
    }
}

/// Handle to the running simulation, shared with transport and HTTP
#[derive(Clone)]
pub struct GameHandle {
    pub cmd_tx: mpsc::Sender<GameCmd>,
    entity_count: Arc<AtomicUsize>,
}

impl GameHandle {
    pub fn entity_count(&self) -> usize {
        self.entity_count.load(Ordering::Relaxed)
    }
}

/// The authoritative simulation task
pub struct GameServer {
    state: GameState,
    cmd_rx: mpsc::Receiver<GameCmd>,
    entity_count: Arc<AtomicUsize>,
}

impl GameServer {
    pub fn new(config: &Config) -> (Self, GameHandle) {
        let seed = config.world_seed.unwrap_or_else(rand::random);
        info!(seed, "Generating world");
        let world = World::generate(seed);

        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let entity_count = Arc::new(AtomicUsize::new(0));

        let handle = GameHandle {
            cmd_tx,
            entity_count: entity_count.clone(),
        };
        let server = Self {
            state: GameState::new(
                world,
                seed,
                config.max_players,
                config.idle_timeout_secs * 1_000,
            ),
            cmd_rx,
            entity_count,
        };
        (server, handle)
    }

    /// Run the fixed-rate tick loop. A tick always runs to completion;
    /// delayed timers simply catch up on the next pass.
    pub async fn run(mut self) {
        info!(tps = SIMULATION_TPS, "Simulation loop started");

        let mut tick_interval = interval(Duration::from_micros(TICK_DURATION_MICROS));
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            if !self.drain_commands() {
                info!("Command channel closed, stopping simulation loop");
                break;
            }
            self.state.run_tick(unix_millis());
            self.entity_count
                .store(self.state.entity_count(), Ordering::Relaxed);
        }
    }

    /// Apply queued session commands. Join/leave are deferred to the top of
    /// the tick, so a newly joined entity's first input is honored the same
    /// tick it joins.
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.cmd_rx.try_recv() {
                Ok(cmd) => self.state.apply(cmd),
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }
}
