//! Flow scheduler: named one-shot and repeating timers
//!
//! Callbacks cannot touch the scheduler directly while it ticks; they queue
//! additions and removals on `FlowCommands`, applied once the tick finishes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatPolicy {
    Once,
    Repeat,
}

pub type FlowCallback<C> = Box<dyn FnMut(&mut C, &mut FlowCommands<C>)>;

pub struct Flow<C> {
    pub name: String,
    pub period_ms: f32,
    pub policy: RepeatPolicy,
    ticks_left: f32,
    callback: FlowCallback<C>,
}

impl<C> Flow<C> {
    pub fn new(
        name: impl Into<String>,
        period_ms: f32,
        policy: RepeatPolicy,
        callback: impl FnMut(&mut C, &mut FlowCommands<C>) + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            period_ms,
            policy,
            ticks_left: period_ms,
            callback: Box::new(callback),
        }
    }

    pub fn ticks_left(&self) -> f32 {
        self.ticks_left
    }
}

/// Mutations requested from inside a tick
pub struct FlowCommands<C> {
    adds: Vec<Flow<C>>,
    removes: Vec<String>,
}

impl<C> Default for FlowCommands<C> {
    fn default() -> Self {
        Self {
            adds: Vec::new(),
            removes: Vec::new(),
        }
    }
}

impl<C> FlowCommands<C> {
    pub fn add(
        &mut self,
        name: impl Into<String>,
        period_ms: f32,
        policy: RepeatPolicy,
        callback: impl FnMut(&mut C, &mut FlowCommands<C>) + 'static,
    ) {
        self.adds.push(Flow::new(name, period_ms, policy, callback));
    }

    pub fn remove(&mut self, name: impl Into<String>) {
        self.removes.push(name.into());
    }
}

pub struct FlowScheduler<C> {
    flows: Vec<Flow<C>>,
}

impl<C> Default for FlowScheduler<C> {
    fn default() -> Self {
        Self { flows: Vec::new() }
    }
}

impl<C> FlowScheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        period_ms: f32,
        policy: RepeatPolicy,
        callback: impl FnMut(&mut C, &mut FlowCommands<C>) + 'static,
    ) {
        self.flows.push(Flow::new(name, period_ms, policy, callback));
    }

    /// Remove every flow with this name
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.flows.len();
        self.flows.retain(|f| f.name != name);
        before - self.flows.len()
    }

    /// Remove every flow whose name starts with `prefix`
    pub fn remove_prefixed(&mut self, prefix: &str) -> usize {
        let before = self.flows.len();
        self.flows.retain(|f| !f.name.starts_with(prefix));
        before - self.flows.len()
    }

    pub fn clear(&mut self) {
        self.flows.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flows.iter().any(|f| f.name == name)
    }

    pub fn time_left(&self, name: &str) -> Option<f32> {
        self.flows
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.ticks_left.max(0.0))
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Advance every flow by `dt_ms`, firing callbacks that came due.
    /// Repeating flows carry their overshoot into the next period.
    pub fn tick(&mut self, dt_ms: f32, ctx: &mut C) {
        let mut commands = FlowCommands::default();
        let mut finished = Vec::new();

        for (i, flow) in self.flows.iter_mut().enumerate() {
            flow.ticks_left -= dt_ms;
            while flow.ticks_left <= 0.0 {
                (flow.callback)(ctx, &mut commands);
                match flow.policy {
                    RepeatPolicy::Once => {
                        finished.push(i);
                        break;
                    }
                    RepeatPolicy::Repeat => {
                        if flow.period_ms <= 0.0 {
                            flow.ticks_left = 0.0;
                            break;
                        }
                        flow.ticks_left += flow.period_ms;
                    }
                }
            }
        }

        for i in finished.into_iter().rev() {
            self.flows.remove(i);
        }
        for name in commands.removes {
            self.remove(&name);
        }
        self.flows.extend(commands.adds);
    }
}
