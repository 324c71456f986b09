//! Browser host
//!
//! Owns both simulations, mounts `<img>` handles into two container elements,
//! feeds pointer/hover/fade input into each tick and drives everything from
//! `requestAnimationFrame`. All listeners and the frame loop are released on
//! `Host::dismiss` (also run on drop).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Document, Element, EventTarget, HtmlElement, HtmlImageElement, MouseEvent, Response, Window};

use super::{clock_seed, content_retry_delay_ms};
use crate::config::SimConfig;
use crate::consts::{SIM_DT, SIM_DT_MS};
use crate::renderer::{HandleRegistry, RenderSurface};
use crate::sim::{
    ContentItem, EntityId, FixedStep, FreeSimulation, LaneSimulation, Simulation, SnapshotEntry, TickInput,
    Transform, Viewport, parse_content,
};

/// Where the layers live and where content comes from
#[derive(Debug, Clone)]
pub struct HostOptions {
    pub lane_selector: String,
    pub free_selector: String,
    pub content_url: String,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            lane_selector: "#lane-layer".into(),
            free_selector: "#free-layer".into(),
            content_url: "/api/featured".into(),
        }
    }
}

/// An event listener that unregisters itself when dropped
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Listener {
    fn attach<F>(target: &EventTarget, kind: &'static str, handler: F) -> Option<Self>
    where
        F: FnMut(web_sys::Event) + 'static,
    {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .ok()?;
        Some(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

struct DomHandle {
    element: HtmlElement,
    _hover: Vec<Listener>,
}

/// Render surface backed by absolutely positioned `<img>` elements
pub struct DomSurface {
    document: Document,
    container: Element,
    handles: HandleRegistry<DomHandle>,
    /// Set for layers whose entities report hover
    hover_input: Option<Rc<RefCell<TickInput>>>,
}

impl DomSurface {
    fn new(document: Document, container: Element, hover_input: Option<Rc<RefCell<TickInput>>>) -> Self {
        Self {
            document,
            container,
            handles: HandleRegistry::new(),
            hover_input,
        }
    }

    fn create_image(&self, entry: &SnapshotEntry) -> Option<HtmlElement> {
        let img: HtmlImageElement = self.document.create_element("img").ok()?.dyn_into().ok()?;
        img.set_src(&entry.content.image);
        img.set_alt("");
        img.set_draggable(false);
        let _ = img.set_attribute("data-content-id", &entry.content.id);

        let style = img.style();
        let size = format!("{:.0}px", entry.size);
        let _ = style.set_property("position", "absolute");
        let _ = style.set_property("left", "0");
        let _ = style.set_property("top", "0");
        let _ = style.set_property("width", &size);
        let _ = style.set_property("height", &size);
        let _ = style.set_property("will-change", "transform");
        Some(img.into())
    }

    fn hover_listeners(&self, element: &HtmlElement, id: EntityId) -> Vec<Listener> {
        let Some(input) = &self.hover_input else {
            return Vec::new();
        };
        let mut listeners = Vec::with_capacity(2);

        let enter = input.clone();
        listeners.extend(Listener::attach(element, "mouseenter", move |_| {
            if let Ok(mut i) = enter.try_borrow_mut() {
                i.hovered = Some(id);
            }
        }));
        let leave = input.clone();
        listeners.extend(Listener::attach(element, "mouseleave", move |_| {
            if let Ok(mut i) = leave.try_borrow_mut() {
                if i.hovered == Some(id) {
                    i.hovered = None;
                }
            }
        }));
        listeners
    }

    /// Remove every mounted element
    fn clear(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.element.remove();
        }
    }
}

impl RenderSurface for DomSurface {
    fn mount(&mut self, entry: &SnapshotEntry) {
        let Some(element) = self.create_image(entry) else {
            log::warn!("Could not create element for #{}", entry.id);
            return;
        };
        if self.container.append_child(&element).is_err() {
            log::warn!("Could not mount #{}", entry.id);
            return;
        }
        let hover = self.hover_listeners(&element, entry.id);
        self.handles.insert(
            entry.id,
            DomHandle {
                element,
                _hover: hover,
            },
        );
    }

    fn unmount(&mut self, id: EntityId) {
        if let Some(handle) = self.handles.remove(id) {
            handle.element.remove();
        }
        // A removed element never fires mouseleave
        if let Some(input) = &self.hover_input {
            if let Ok(mut i) = input.try_borrow_mut() {
                if i.hovered == Some(id) {
                    i.hovered = None;
                }
            }
        }
    }

    fn write_transform(&mut self, transform: &Transform) {
        let css = match transform.rotation {
            Some(deg) => format!(
                "translate3d({:.2}px, {:.2}px, 0) rotate({:.2}deg)",
                transform.x, transform.y, deg
            ),
            None => format!("translate3d({:.2}px, {:.2}px, 0)", transform.x, transform.y),
        };
        self.handles.write(transform.id, |h| {
            let _ = h.element.style().set_property("transform", &css);
        });
    }
}

fn viewport_of(element: &Element) -> Viewport {
    Viewport::new(element.client_width() as f32, element.client_height() as f32)
}

/// One simulation bound to its container
struct Layer<S> {
    sim: S,
    surface: DomSurface,
    container: Element,
}

impl<S: Simulation> Layer<S> {
    fn step(&mut self, input: &TickInput) {
        let commands = self.sim.advance(input, SIM_DT_MS);
        self.surface.apply(&commands);
    }

    fn sync_viewport(&mut self) {
        self.sim.set_viewport(viewport_of(&self.container));
    }

    /// Input in container coordinates, with the fade read from `data-fade`
    fn local_input(&self, raw: &TickInput) -> TickInput {
        let left = self.container.get_bounding_client_rect().left() as f32;
        let fade = self
            .container
            .get_attribute("data-fade")
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(0.0);
        TickInput {
            pointer_x: raw.pointer_x.map(|x| x - left),
            hovered: raw.hovered,
            fade,
        }
    }
}

struct HostState {
    lane: Option<Layer<LaneSimulation>>,
    free: Option<Layer<FreeSimulation>>,
    clock: FixedStep,
    last_time: f64,
    paused: bool,
}

impl HostState {
    fn sync_viewports(&mut self) {
        if let Some(lane) = self.lane.as_mut() {
            lane.sync_viewport();
        }
        if let Some(free) = self.free.as_mut() {
            free.sync_viewport();
        }
    }

    fn set_content(&mut self, items: Vec<ContentItem>) {
        if let Some(lane) = self.lane.as_mut() {
            lane.sim.set_content(items.clone());
        }
        if let Some(free) = self.free.as_mut() {
            free.sim.set_content(items);
        }
    }

    fn teardown(&mut self) {
        if let Some(mut lane) = self.lane.take() {
            lane.surface.clear();
        }
        if let Some(mut free) = self.free.take() {
            free.surface.clear();
        }
    }
}

type FrameCallback = Closure<dyn FnMut(f64)>;

/// Running decoration layer; dropping it tears everything down
pub struct Host {
    state: Rc<RefCell<HostState>>,
    input: Rc<RefCell<TickInput>>,
    frame: Rc<RefCell<Option<FrameCallback>>>,
    frame_handle: Rc<Cell<Option<i32>>>,
    listeners: Vec<Listener>,
    active: bool,
}

impl Host {
    /// Bind to the containers named in `options` and start ticking
    ///
    /// Returns None when neither container exists on the page.
    pub fn start(options: &HostOptions, config: &SimConfig) -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        let seed = config.seed.unwrap_or_else(clock_seed);
        let input = Rc::new(RefCell::new(TickInput::default()));

        let lane = document
            .query_selector(&options.lane_selector)
            .ok()
            .flatten()
            .map(|container| Layer {
                sim: LaneSimulation::new(config.effective_lane(), viewport_of(&container), seed),
                surface: DomSurface::new(document.clone(), container.clone(), Some(input.clone())),
                container,
            });
        let free = document
            .query_selector(&options.free_selector)
            .ok()
            .flatten()
            .map(|container| Layer {
                sim: FreeSimulation::new(config.effective_free(), viewport_of(&container), seed.wrapping_add(1)),
                surface: DomSurface::new(document.clone(), container.clone(), None),
                container,
            });
        if lane.is_none() && free.is_none() {
            log::warn!(
                "No layer containers found ({} / {})",
                options.lane_selector,
                options.free_selector
            );
            return None;
        }

        let state = Rc::new(RefCell::new(HostState {
            lane,
            free,
            clock: FixedStep::new(),
            last_time: 0.0,
            paused: false,
        }));

        let mut host = Self {
            state,
            input,
            frame: Rc::new(RefCell::new(None)),
            frame_handle: Rc::new(Cell::new(None)),
            listeners: Vec::new(),
            active: true,
        };
        host.attach_input(&window, &document);
        host.fetch_content(options.content_url.clone());
        host.start_frames();

        log::info!("Kinetic layer running (seed {seed}, density {})", config.density.as_str());
        Some(host)
    }

    fn attach_input(&mut self, window: &Window, document: &Document) {
        // Pointer position, in client coordinates
        let input = self.input.clone();
        self.listeners.extend(Listener::attach(window, "pointermove", move |event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                if let Ok(mut i) = input.try_borrow_mut() {
                    i.pointer_x = Some(mouse.client_x() as f32);
                }
            }
        }));

        // Pointer left the page
        if let Some(root) = document.document_element() {
            let input = self.input.clone();
            self.listeners.extend(Listener::attach(&root, "mouseleave", move |_| {
                if let Ok(mut i) = input.try_borrow_mut() {
                    i.pointer_x = None;
                }
            }));
        }

        // Viewport bounds follow the containers
        let state = Rc::downgrade(&self.state);
        self.listeners.extend(Listener::attach(window, "resize", move |_| {
            if let Some(state) = state.upgrade() {
                if let Ok(mut s) = state.try_borrow_mut() {
                    s.sync_viewports();
                }
            }
        }));

        // Stop ticking while the tab is hidden
        let state = Rc::downgrade(&self.state);
        let doc = document.clone();
        self.listeners.extend(Listener::attach(document, "visibilitychange", move |_| {
            let Some(state) = state.upgrade() else {
                return;
            };
            if let Ok(mut s) = state.try_borrow_mut() {
                s.paused = doc.visibility_state() == web_sys::VisibilityState::Hidden;
                if s.paused {
                    log::info!("Paused (tab hidden)");
                } else {
                    s.last_time = 0.0;
                    s.clock.reset();
                }
            }
        }));
    }

    /// Fetch content in the background, retrying with backoff until it arrives
    fn fetch_content(&self, url: String) {
        let state = Rc::downgrade(&self.state);
        spawn_local(async move {
            let mut attempt = 0;
            while let Some(delay) = content_retry_delay_ms(attempt) {
                if delay > 0 {
                    sleep_ms(delay).await;
                }
                // Dismissed while waiting
                if state.upgrade().is_none() {
                    return;
                }
                let items = fetch_items(&url).await;
                if !items.is_empty() {
                    let Some(state) = state.upgrade() else {
                        return;
                    };
                    if let Ok(mut s) = state.try_borrow_mut() {
                        s.set_content(items);
                    }
                    return;
                }
                attempt += 1;
                log::warn!("No content from {url} (attempt {attempt})");
            }
            log::warn!("Giving up on {url}; nothing to spawn");
        });
    }

    fn start_frames(&mut self) {
        let state = self.state.clone();
        let input = self.input.clone();
        let frame = self.frame.clone();
        let handle = self.frame_handle.clone();

        *self.frame.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |time: f64| {
            run_frame(&state, &input, time);
            if let Some(callback) = frame.borrow().as_ref() {
                handle.set(request_frame(callback));
            }
        }));

        if let Some(callback) = self.frame.borrow().as_ref() {
            self.frame_handle.set(request_frame(callback));
        }
    }

    /// Cancel the frame loop, drop every listener and unmount every element
    pub fn dismiss(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if let Some(handle) = self.frame_handle.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle);
            }
        }
        // Breaks the closure's reference back to its own slot
        self.frame.borrow_mut().take();
        self.listeners.clear();
        if let Ok(mut s) = self.state.try_borrow_mut() {
            s.teardown();
        }
        log::info!("Kinetic layer dismissed");
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.dismiss();
    }
}

fn request_frame(callback: &FrameCallback) -> Option<i32> {
    web_sys::window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .ok()
}

fn run_frame(state: &Rc<RefCell<HostState>>, input: &Rc<RefCell<TickInput>>, time: f64) {
    let Ok(mut s) = state.try_borrow_mut() else {
        return;
    };
    if s.paused {
        return;
    }

    let dt = if s.last_time > 0.0 {
        ((time - s.last_time) / 1000.0) as f32
    } else {
        SIM_DT
    };
    s.last_time = time;
    let steps = s.clock.frames(dt);
    let raw = input.try_borrow().map(|i| i.clone()).unwrap_or_default();

    let HostState { lane, free, .. } = &mut *s;
    if let Some(lane) = lane.as_mut() {
        let tick_input = lane.local_input(&raw);
        for _ in 0..steps {
            lane.step(&tick_input);
        }
    }
    if let Some(free) = free.as_mut() {
        let tick_input = TickInput::default();
        for _ in 0..steps {
            free.step(&tick_input);
        }
    }
}

/// Fetch and parse the content list; any failure yields an empty list
pub async fn fetch_items(url: &str) -> Vec<ContentItem> {
    match fetch_text(url).await {
        Some(body) => parse_content(&body),
        None => {
            log::warn!("Content fetch failed: {url}");
            Vec::new()
        }
    }
}

async fn fetch_text(url: &str) -> Option<String> {
    let window = web_sys::window()?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .ok()?
        .dyn_into()
        .ok()?;
    if !response.ok() {
        return None;
    }
    JsFuture::from(response.text().ok()?).await.ok()?.as_string()
}

/// Resolve after `ms` via `setTimeout`
async fn sleep_ms(ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve: js_sys::Function, _reject: js_sys::Function| {
        let scheduled = web_sys::window().is_some_and(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32)
                .is_ok()
        });
        if !scheduled {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = JsFuture::from(promise).await;
}

fn prefers_reduced_motion(window: &Window) -> bool {
    window
        .match_media("(prefers-reduced-motion: reduce)")
        .ok()
        .flatten()
        .map(|mql| mql.matches())
        .unwrap_or(false)
}

thread_local! {
    static HOST: RefCell<Option<Host>> = const { RefCell::new(None) };
}

/// Start the decoration layer with stored config and default selectors
#[wasm_bindgen]
pub fn start_layer() {
    let config = SimConfig::load();
    let reduced = config.reduced_motion || web_sys::window().is_some_and(|w| prefers_reduced_motion(&w));
    if reduced {
        log::info!("Reduced motion requested; decoration disabled");
        return;
    }
    let host = Host::start(&HostOptions::default(), &config);
    HOST.with(|slot| {
        // Replacing a running host drops (and dismisses) it
        *slot.borrow_mut() = host;
    });
}

/// Tear down the layer when its owning view is dismissed
#[wasm_bindgen]
pub fn dismiss_layer() {
    let host = HOST.with(|slot| slot.borrow_mut().take());
    drop(host);
}
