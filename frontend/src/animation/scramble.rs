//! Two-phase text reveal: every letter flickers through random glyphs for a
//! while, then the real letters lock in one by one, left to right.
//!
//! [`ScrambleJob`] is the text state and [`ScramblePlan`] the timing; both are
//! plain data. [`ScrambleTextEngine`] drives them against one DOM text node with
//! gloo timers and hands back an awaitable, cancellable [`ScrambleHandle`].

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{self, AbortHandle, Abortable, FutureExt, LocalBoxFuture, Shared};
use gloo_timers::future::TimeoutFuture;
use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use wasm_bindgen_futures::spawn_local;
use web_sys::Element;

use crate::config;

#[derive(Clone, Debug, PartialEq)]
pub struct ScrambleOptions {
    pub duration_ms: u32,
    /// Share of the duration spent scrambling before the first letter locks in.
    pub scramble_ratio: f64,
    pub glyphs: Vec<char>,
    pub tick_ms: u32,
    pub min_reveal_interval_ms: u32,
}

impl Default for ScrambleOptions {
    fn default() -> Self {
        Self {
            duration_ms: config::SCRAMBLE_DURATION_MS,
            scramble_ratio: config::SCRAMBLE_RATIO,
            glyphs: config::SCRAMBLE_GLYPHS.chars().collect(),
            tick_ms: config::SCRAMBLE_TICK_MS,
            min_reveal_interval_ms: config::SCRAMBLE_MIN_REVEAL_INTERVAL_MS,
        }
    }
}

impl ScrambleOptions {
    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Compresses the duration when the page is being scrolled fast.
    pub fn time_scaled(mut self, time_scale: f64) -> Self {
        if time_scale > 1.0 {
            self.duration_ms = (self.duration_ms as f64 / time_scale).round() as u32;
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScramblePlan {
    pub scramble_ms: u32,
    pub reveal_ms: u32,
    pub reveal_interval_ms: u32,
    pub tick_ms: u32,
    pub reveal_count: usize,
}

impl ScramblePlan {
    pub fn new(text: &str, options: &ScrambleOptions) -> Self {
        let ratio = options.scramble_ratio.clamp(0.0, 1.0);
        let scramble_ms = (options.duration_ms as f64 * ratio).round() as u32;
        let reveal_ms = options.duration_ms.saturating_sub(scramble_ms);
        let reveal_count = text.chars().filter(|c| !c.is_whitespace()).count();
        let even_share = if reveal_count == 0 {
            reveal_ms
        } else {
            reveal_ms / reveal_count as u32
        };
        Self {
            scramble_ms,
            reveal_ms,
            reveal_interval_ms: even_share.max(options.min_reveal_interval_ms),
            tick_ms: options.tick_ms.max(1),
            reveal_count,
        }
    }

    /// When the last letter locks in, measured from the start of the run.
    pub fn completion_ms(&self) -> u32 {
        self.scramble_ms + self.reveal_interval_ms * self.reveal_count as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScramblePhase {
    Scrambling,
    Revealing,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reveal {
    pub index: usize,
    pub character: char,
}

#[derive(Clone, Debug)]
pub struct ScrambleJob {
    target: Vec<char>,
    display: Vec<char>,
    revealed: Vec<bool>,
    reveal_order: Vec<usize>,
    next_reveal: usize,
    phase: ScramblePhase,
    glyphs: Vec<char>,
}

impl ScrambleJob {
    pub fn new(text: &str, glyphs: &[char]) -> Self {
        let target: Vec<char> = text.chars().collect();
        let reveal_order = target
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_whitespace())
            .map(|(i, _)| i)
            .collect();
        let glyphs = if glyphs.is_empty() {
            config::SCRAMBLE_GLYPHS.chars().collect()
        } else {
            glyphs.to_vec()
        };
        Self {
            display: target.clone(),
            revealed: vec![false; target.len()],
            target,
            reveal_order,
            next_reveal: 0,
            phase: ScramblePhase::Scrambling,
            glyphs,
        }
    }

    pub fn phase(&self) -> ScramblePhase {
        self.phase
    }

    pub fn render(&self) -> String {
        self.display.iter().collect()
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.next_reveal >= self.reveal_order.len()
    }

    /// Repaints every unrevealed letter with a random glyph. Whitespace is
    /// never touched.
    pub fn scramble_tick<R: Rng>(&mut self, rng: &mut R) -> String {
        if self.phase != ScramblePhase::Done {
            for (i, c) in self.target.iter().enumerate() {
                if !self.revealed[i] && !c.is_whitespace() {
                    self.display[i] = self.glyphs[rng.gen_range(0..self.glyphs.len())];
                }
            }
        }
        self.render()
    }

    pub fn begin_reveal(&mut self) -> String {
        if self.phase == ScramblePhase::Scrambling {
            self.phase = ScramblePhase::Revealing;
            for (i, c) in self.target.iter().enumerate() {
                if c.is_whitespace() {
                    self.revealed[i] = true;
                    self.display[i] = *c;
                }
            }
        }
        self.render()
    }

    /// Locks in the next letter, left to right. `None` outside the reveal
    /// phase or once every letter is in place.
    pub fn reveal_next(&mut self) -> Option<Reveal> {
        if self.phase != ScramblePhase::Revealing {
            return None;
        }
        let index = *self.reveal_order.get(self.next_reveal)?;
        self.next_reveal += 1;
        self.revealed[index] = true;
        self.display[index] = self.target[index];
        Some(Reveal {
            index,
            character: self.target[index],
        })
    }

    /// Writes the exact target, whatever the timers managed to do.
    pub fn finish(&mut self) -> String {
        self.phase = ScramblePhase::Done;
        self.display = self.target.clone();
        self.revealed.iter_mut().for_each(|r| *r = true);
        self.render()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrambleOutcome {
    Completed,
    Cancelled,
}

pub type ScrambleCompletion = Shared<LocalBoxFuture<'static, ScrambleOutcome>>;

/// Handle to one scramble run. Await [`ScrambleHandle::completion`] or register
/// [`ScrambleHandle::on_complete`]; either resolves exactly once.
pub struct ScrambleHandle {
    abort: Option<AbortHandle>,
    completion: ScrambleCompletion,
}

impl ScrambleHandle {
    fn resolved() -> Self {
        Self {
            abort: None,
            completion: future::ready(ScrambleOutcome::Completed).boxed_local().shared(),
        }
    }

    /// Stops this run. Does nothing once it has resolved.
    pub fn cancel(&self) {
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn completion(&self) -> ScrambleCompletion {
        self.completion.clone()
    }

    /// Runs `callback` once the text has fully resolved. Cancelled runs never
    /// call it.
    pub fn on_complete(&self, callback: impl FnOnce() + 'static) {
        let completion = self.completion();
        spawn_local(async move {
            if completion.await == ScrambleOutcome::Completed {
                callback();
            }
        });
    }
}

/// Scrambles one text node. Starting a run cancels the previous one first, so
/// two runs never write to the same node.
#[derive(Clone, Default)]
pub struct ScrambleTextEngine {
    current: Rc<RefCell<Option<AbortHandle>>>,
}

impl PartialEq for ScrambleTextEngine {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.current, &other.current)
    }
}

impl ScrambleTextEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&self, element: Option<Element>, text: &str, options: &ScrambleOptions) -> ScrambleHandle {
        self.cancel();
        let Some(element) = element else {
            return ScrambleHandle::resolved();
        };
        let plan = ScramblePlan::new(text, options);
        if plan.reveal_count == 0 {
            element.set_text_content(Some(text));
            return ScrambleHandle::resolved();
        }
        debug!("scramble '{}' resolves after {}ms: {:?}", text, plan.completion_ms(), plan);

        let job = ScrambleJob::new(text, &options.glyphs);
        let (handle, task) = self.launch(drive(element, job, plan));
        spawn_local(task);
        handle
    }

    /// Makes `work` the current run, aborting the one it replaces. The run only
    /// advances while the returned task is polled; the handle resolves when the
    /// task ends, or as cancelled if the task is dropped unpolled.
    fn launch(&self, work: impl Future<Output = ()> + 'static) -> (ScrambleHandle, LocalBoxFuture<'static, ()>) {
        let (abort, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.current.replace(Some(abort.clone())) {
            previous.abort();
        }

        let run = Abortable::new(work, registration);
        let (done_tx, done_rx) = oneshot::channel();
        let task = async move {
            let outcome = match run.await {
                Ok(()) => ScrambleOutcome::Completed,
                Err(_) => ScrambleOutcome::Cancelled,
            };
            let _ = done_tx.send(outcome);
        }
        .boxed_local();

        let handle = ScrambleHandle {
            abort: Some(abort),
            completion: done_rx
                .map(|outcome| outcome.unwrap_or(ScrambleOutcome::Cancelled))
                .boxed_local()
                .shared(),
        };
        (handle, task)
    }

    pub fn cancel(&self) {
        if let Some(abort) = self.current.borrow_mut().take() {
            abort.abort();
        }
    }
}

async fn drive(element: Element, job: ScrambleJob, plan: ScramblePlan) {
    let job = Rc::new(RefCell::new(job));
    let rng = Rc::new(RefCell::new(SmallRng::from_entropy()));

    let first = job.borrow_mut().scramble_tick(&mut *rng.borrow_mut());
    element.set_text_content(Some(&first));

    let scrambling = scramble_loop(job.clone(), rng.clone(), element.clone(), plan.tick_ms);
    future::select(
        scrambling.boxed_local(),
        TimeoutFuture::new(plan.scramble_ms).boxed_local(),
    )
    .await;

    let revealing_start = job.borrow_mut().begin_reveal();
    element.set_text_content(Some(&revealing_start));

    let revealing = reveal_loop(job.clone(), element.clone(), plan.reveal_interval_ms);
    let scrambling = scramble_loop(job.clone(), rng, element.clone(), plan.tick_ms);
    future::select(revealing.boxed_local(), scrambling.boxed_local()).await;

    let settled = job.borrow_mut().finish();
    element.set_text_content(Some(&settled));
}

async fn scramble_loop(job: Rc<RefCell<ScrambleJob>>, rng: Rc<RefCell<SmallRng>>, element: Element, tick_ms: u32) {
    loop {
        TimeoutFuture::new(tick_ms).await;
        let text = job.borrow_mut().scramble_tick(&mut *rng.borrow_mut());
        element.set_text_content(Some(&text));
    }
}

async fn reveal_loop(job: Rc<RefCell<ScrambleJob>>, element: Element, interval_ms: u32) {
    while !job.borrow().is_fully_revealed() {
        TimeoutFuture::new(interval_ms).await;
        if job.borrow_mut().reveal_next().is_none() {
            break;
        }
        let text = job.borrow().render();
        element.set_text_content(Some(&text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl ScrambleJob {
        fn revealed_count(&self) -> usize {
            self.next_reveal
        }
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    /// Replays a run on a fake clock the way the timers would: scramble ticks
    /// every `tick_ms` until the scramble window closes, then one reveal every
    /// `reveal_interval_ms`. Returns the reveal log and the completion time.
    fn replay(text: &str, options: &ScrambleOptions) -> (Vec<Reveal>, u32, String) {
        let plan = ScramblePlan::new(text, options);
        let mut job = ScrambleJob::new(text, &options.glyphs);
        let mut rng = rng();
        if plan.reveal_count == 0 {
            return (Vec::new(), 0, job.finish());
        }
        let mut now = 0;
        job.scramble_tick(&mut rng);
        while now + plan.tick_ms < plan.scramble_ms {
            now += plan.tick_ms;
            job.scramble_tick(&mut rng);
        }
        now = plan.scramble_ms;
        job.begin_reveal();
        let mut reveals = Vec::new();
        while !job.is_fully_revealed() {
            now += plan.reveal_interval_ms;
            reveals.push(job.reveal_next().expect("reveal while letters remain"));
            job.scramble_tick(&mut rng);
        }
        (reveals, now, job.finish())
    }

    #[test]
    fn servicios_plan_matches_budget() {
        let options = ScrambleOptions::default().with_duration(800);
        let plan = ScramblePlan::new("Servicios", &options);
        assert_eq!(plan.scramble_ms, 240);
        assert_eq!(plan.reveal_ms, 560);
        assert_eq!(plan.reveal_count, 9);
        assert!(plan.reveal_interval_ms >= 20);
        assert_eq!(plan.reveal_interval_ms, 62);
        assert!(plan.completion_ms() <= 800);

        let (reveals, done_at, text) = replay("Servicios", &options);
        assert_eq!(reveals.len(), 9);
        assert_eq!(done_at, plan.completion_ms());
        assert_eq!(text, "Servicios");
    }

    #[test]
    fn reveal_interval_respects_floor() {
        let options = ScrambleOptions::default().with_duration(300);
        let text = "a".repeat(50);
        let plan = ScramblePlan::new(&text, &options);
        assert_eq!(plan.reveal_interval_ms, 20);
        assert!(plan.completion_ms() > 300);
    }

    #[test]
    fn every_letter_revealed_once_left_to_right() {
        let options = ScrambleOptions::default();
        for text in ["Servicios", "Hola mundo", " a  b ", "ñandú café", "x"] {
            let (reveals, _, rendered) = replay(text, &options);
            let expected: Vec<usize> = text
                .chars()
                .enumerate()
                .filter(|(_, c)| !c.is_whitespace())
                .map(|(i, _)| i)
                .collect();
            let indices: Vec<usize> = reveals.iter().map(|r| r.index).collect();
            assert_eq!(indices, expected, "reveal order for {text:?}");
            assert!(indices.windows(2).all(|w| w[0] < w[1]));
            let chars: Vec<char> = text.chars().collect();
            assert!(reveals.iter().all(|r| chars[r.index] == r.character));
            assert_eq!(rendered, text);
        }
    }

    #[test]
    fn empty_and_blank_text_resolve_to_themselves() {
        let options = ScrambleOptions::default();
        for text in ["", "   ", "\t"] {
            let plan = ScramblePlan::new(text, &options);
            assert_eq!(plan.reveal_count, 0);
            let (reveals, done_at, rendered) = replay(text, &options);
            assert!(reveals.is_empty());
            assert_eq!(done_at, 0);
            assert_eq!(rendered, text);
        }
    }

    #[test]
    fn scramble_keeps_spaces_and_draws_from_pool() {
        let mut job = ScrambleJob::new("ab cd", &['#']);
        let shown = job.scramble_tick(&mut rng());
        assert_eq!(shown, "## ##");
    }

    #[test]
    fn revealed_letters_survive_later_ticks() {
        let mut job = ScrambleJob::new("abc", &['#']);
        let mut rng = rng();
        job.scramble_tick(&mut rng);
        assert_eq!(job.reveal_next(), None, "no reveals before the reveal phase");
        job.begin_reveal();
        assert_eq!(job.reveal_next(), Some(Reveal { index: 0, character: 'a' }));
        assert_eq!(job.scramble_tick(&mut rng), "a##");
        job.reveal_next();
        job.reveal_next();
        assert!(job.is_fully_revealed());
        assert_eq!(job.reveal_next(), None);
        assert_eq!(job.render(), "abc");
        assert_eq!(job.revealed_count(), 3);
    }

    #[test]
    fn finish_overrides_partial_state() {
        let mut job = ScrambleJob::new("Contacto", &[]);
        job.scramble_tick(&mut rng());
        assert_eq!(job.finish(), "Contacto");
        assert_eq!(job.phase(), ScramblePhase::Done);
        assert_eq!(job.scramble_tick(&mut rng()), "Contacto");
    }

    #[test]
    fn fast_scroll_compresses_duration() {
        let options = ScrambleOptions::default().with_duration(900).time_scaled(3.0);
        assert_eq!(options.duration_ms, 300);
        let unchanged = ScrambleOptions::default().with_duration(900).time_scaled(0.5);
        assert_eq!(unchanged.duration_ms, 900);
    }

    mod handles {
        use super::*;
        use futures::executor::{block_on, LocalPool};
        use futures::task::LocalSpawnExt;

        #[test]
        fn absent_element_resolves_immediately() {
            let engine = ScrambleTextEngine::new();
            let handle = engine.run(None, "Servicios", &ScrambleOptions::default());
            assert_eq!(block_on(handle.completion()), ScrambleOutcome::Completed);
        }

        #[test]
        fn rerun_cancels_the_previous_run() {
            let engine = ScrambleTextEngine::new();
            let mut pool = LocalPool::new();
            let (first, first_task) = engine.launch(future::pending());
            let (second, second_task) = engine.launch(future::ready(()));
            pool.spawner().spawn_local(first_task).unwrap();
            pool.spawner().spawn_local(second_task).unwrap();

            assert_eq!(pool.run_until(first.completion()), ScrambleOutcome::Cancelled);
            assert_eq!(pool.run_until(second.completion()), ScrambleOutcome::Completed);
        }

        #[test]
        fn handle_resolves_exactly_once() {
            let engine = ScrambleTextEngine::new();
            let mut pool = LocalPool::new();
            let (handle, task) = engine.launch(future::ready(()));
            pool.spawner().spawn_local(task).unwrap();

            assert_eq!(pool.run_until(handle.completion()), ScrambleOutcome::Completed);
            // Cancelling after the fact cannot change the outcome.
            handle.cancel();
            engine.cancel();
            assert_eq!(pool.run_until(handle.completion()), ScrambleOutcome::Completed);
            assert_eq!(block_on(handle.completion()), ScrambleOutcome::Completed);
        }

        #[test]
        fn cancelled_handle_stops_its_run() {
            let engine = ScrambleTextEngine::new();
            let mut pool = LocalPool::new();
            let (handle, task) = engine.launch(future::pending());
            pool.spawner().spawn_local(task).unwrap();
            pool.run_until_stalled();

            handle.cancel();
            assert_eq!(pool.run_until(handle.completion()), ScrambleOutcome::Cancelled);
        }

        #[test]
        fn dropped_task_counts_as_cancelled() {
            let engine = ScrambleTextEngine::new();
            let (handle, task) = engine.launch(future::pending());
            drop(task);
            assert_eq!(block_on(handle.completion()), ScrambleOutcome::Cancelled);
        }
    }
}
