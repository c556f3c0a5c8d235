use gloo_events::EventListener;
use gloo_net::http::Request;
use log::{info, warn};
use serde_json::json;
use web_sys::{Element, HtmlElement, HtmlInputElement};
use yew::prelude::*;

use crate::animation::booking::{self, BookingOutcome};
use crate::animation::frame::FrameScheduler;
use crate::animation::scramble::{ScrambleHandle, ScrambleTextEngine};
use crate::animation::tween::ElementAnimator;
use crate::animation::viewport::{self, EnterOnce};
use crate::config;

pub enum BookingMsg {
    CheckVisible,
    SetName(String),
    SetEmail(String),
    SetDate(String),
    SetMessage(String),
    Submit,
    Sent(bool),
}

pub struct BookingForm {
    panel_ref: NodeRef,
    title_ref: NodeRef,
    panel: Option<ElementAnimator>,
    title_engine: ScrambleTextEngine,
    title_scramble: Option<ScrambleHandle>,
    scroll: Option<EventListener>,
    scheduler: FrameScheduler,
    entry: EnterOnce,
    sending: bool,
    outcome: Option<BookingOutcome>,
    result_shown: bool,
    name: String,
    email: String,
    date: String,
    message: String,
}

impl Component for BookingForm {
    type Message = BookingMsg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            panel_ref: NodeRef::default(),
            title_ref: NodeRef::default(),
            panel: None,
            title_engine: ScrambleTextEngine::new(),
            title_scramble: None,
            scroll: None,
            scheduler: FrameScheduler::new(),
            entry: EnterOnce::new(config::TITLE_ENTER_FRACTION),
            sending: false,
            outcome: None,
            result_shown: false,
            name: String::new(),
            email: String::new(),
            date: String::new(),
            message: String::new(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            BookingMsg::CheckVisible => {
                let (Some(element), Some(panel)) = (self.panel_ref.cast::<Element>(), self.panel.as_ref()) else {
                    return false;
                };
                if self.entry.observe(viewport::element_own_fraction(&element)) {
                    booking::initial_appear(panel);
                    self.scroll = None;
                }
                false
            }
            BookingMsg::SetName(value) => {
                self.name = value;
                false
            }
            BookingMsg::SetEmail(value) => {
                self.email = value;
                false
            }
            BookingMsg::SetDate(value) => {
                self.date = value;
                false
            }
            BookingMsg::SetMessage(value) => {
                self.message = value;
                false
            }
            BookingMsg::Submit => {
                if self.sending {
                    return false;
                }
                self.sending = true;
                let body = json!({
                    "name": self.name.trim(),
                    "email": self.email.trim(),
                    "date": self.date,
                    "message": self.message.trim(),
                    "sent_at": chrono::Utc::now().to_rfc3339(),
                });
                ctx.link().send_future(async move {
                    let request = match Request::post(&config::get_booking_webhook_url()).json(&body) {
                        Ok(req) => req,
                        Err(e) => {
                            warn!("could not encode booking: {}", e);
                            return BookingMsg::Sent(false);
                        }
                    };
                    match request.send().await {
                        Ok(response) => BookingMsg::Sent(response.ok()),
                        Err(e) => {
                            gloo_console::error!(format!("booking request failed: {}", e));
                            BookingMsg::Sent(false)
                        }
                    }
                });
                true
            }
            BookingMsg::Sent(sent) => {
                let outcome = BookingOutcome::from_sent(sent);
                info!("booking finished: {:?}", outcome);
                self.sending = false;
                self.outcome = Some(outcome);
                true
            }
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            if let Some(element) = self.panel_ref.cast::<HtmlElement>() {
                self.panel = Some(ElementAnimator::new(element, booking::resting_state()));
            }
            // One visibility check per frame, however many scroll events land in it.
            let link = ctx.link().clone();
            let scheduler = self.scheduler.clone();
            self.scroll = web_sys::window().map(|window| {
                EventListener::new(&window, "scroll", move |_| {
                    let link = link.clone();
                    scheduler.schedule(move |_| link.send_message(BookingMsg::CheckVisible));
                })
            });
            ctx.link().send_message(BookingMsg::CheckVisible);
            return;
        }

        // The result view has just been rendered into the same panel.
        if let (Some(outcome), Some(panel)) = (self.outcome, self.panel.as_ref()) {
            if !self.result_shown && self.title_ref.get().is_some() {
                self.title_scramble = Some(booking::result_appear(
                    panel,
                    &self.title_engine,
                    self.title_ref.cast::<Element>(),
                    outcome,
                ));
                self.result_shown = true;
            }
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.scroll = None;
        self.scheduler.cancel();
        if let Some(handle) = self.title_scramble.take() {
            handle.cancel();
        }
        if let Some(panel) = self.panel.take() {
            panel.dispose();
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let input = |to_msg: fn(String) -> BookingMsg| {
            link.callback(move |e: InputEvent| {
                let target: HtmlInputElement = e.target_unchecked_into();
                to_msg(target.value())
            })
        };
        let onsubmit = link.callback(|e: SubmitEvent| {
            e.prevent_default();
            BookingMsg::Submit
        });

        let body = match self.outcome {
            Some(outcome) => html! {
                <div class={classes!("booking-result", (outcome == BookingOutcome::Failure).then_some("failed"))}>
                    <h2 aria-label={outcome.title()}><span ref={self.title_ref.clone()} aria-hidden="true"></span></h2>
                    <p>{ outcome.message() }</p>
                </div>
            },
            None => html! {
                <form class="booking-form" {onsubmit}>
                    <h2>{"Reserva una llamada"}</h2>
                    <label>{"Nombre"}
                        <input type="text" required=true oninput={input(BookingMsg::SetName)} />
                    </label>
                    <label>{"Email"}
                        <input type="email" required=true oninput={input(BookingMsg::SetEmail)} />
                    </label>
                    <label>{"Fecha preferida"}
                        <input type="date" oninput={input(BookingMsg::SetDate)} />
                    </label>
                    <label>{"Cuéntanos tu proyecto"}
                        <input type="text" oninput={input(BookingMsg::SetMessage)} />
                    </label>
                    <button type="submit" disabled={self.sending}>
                        { if self.sending { "Enviando..." } else { "Reservar" } }
                    </button>
                </form>
            },
        };

        html! {
            <section id="reservar" class="booking">
                <div class="booking-panel" ref={self.panel_ref.clone()}>
                    { body }
                </div>
            </section>
        }
    }
}
