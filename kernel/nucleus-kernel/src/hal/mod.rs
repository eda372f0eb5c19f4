//! Driver registry and the `detect_hardware` probe pipeline.
//!
//! One process-wide [`HalContext`] holds everything the boot sequence
//! builds up before handing control to the rest of the kernel: the sorted
//! list of probe descriptors, the registered font/logo assets, and whichever
//! console/TTY pair ends up wired together. Modeled as a single struct
//! behind a `static HAL: LazyLock<HalContext>`, the same way the teacher
//! installs its `GDT`/`IDT`/`TSS` singletons.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use nucleus_core::sync::{LazyLock, SpinLock};
use nucleus_driver_api::{best_fit, Console, DriverDescriptor, DriverKind, Font, Logo, Tty};

use crate::multiboot;

/// Process-wide driver registry and post-probe capability state.
pub struct HalContext {
    registry: SpinLock<Vec<DriverDescriptor>>,
    fonts: SpinLock<Vec<Font>>,
    logos: SpinLock<Vec<Logo>>,
    active_console: SpinLock<Option<Arc<dyn Console>>>,
    active_tty: SpinLock<Option<Arc<dyn Tty>>>,
}

// SAFETY: every field is a `SpinLock`-guarded collection of `Send + Sync`
// trait objects or plain data; there is no thread-unsafe interior state.
unsafe impl Sync for HalContext {}

impl HalContext {
    const fn new() -> Self {
        Self {
            registry: SpinLock::new(Vec::new()),
            fonts: SpinLock::new(Vec::new()),
            logos: SpinLock::new(Vec::new()),
            active_console: SpinLock::new(None),
            active_tty: SpinLock::new(None),
        }
    }
}

static HAL: LazyLock<HalContext> = LazyLock::new(HalContext::new);

/// Registers a driver descriptor for the next [`detect_hardware`] pass.
///
/// Registration order is preserved as the stable-sort tiebreak among
/// descriptors sharing the same [`nucleus_driver_api::DriverOrder`] value.
pub fn register(descriptor: DriverDescriptor) {
    HAL.registry.lock().push(descriptor);
}

/// Registers a selectable font for best-fit console matching.
pub fn register_font(font: Font) {
    HAL.fonts.lock().push(font);
}

/// Registers a selectable boot-splash logo for best-fit console matching.
pub fn register_logo(logo: Logo) {
    HAL.logos.lock().push(logo);
}

/// Returns the currently attached console, if any driver has wired one up.
#[must_use]
pub fn active_console() -> Option<Arc<dyn Console>> {
    HAL.active_console.lock().clone()
}

/// Returns the currently attached TTY, if any driver has wired one up.
#[must_use]
pub fn active_tty() -> Option<Arc<dyn Tty>> {
    HAL.active_tty.lock().clone()
}

/// Runs every registered descriptor's `probe`, in ascending `order`
/// (ties broken by registration order, since the sort is stable), calls
/// `init` on each driver a probe found, and wires capability-providing
/// drivers through the post-init hook.
///
/// A probe returning `None` is skipped silently. An `init` failure is
/// logged at [`nucleus_core::log::LogLevel::Error`] and that driver is
/// skipped; probing continues with the next descriptor.
pub fn detect_hardware() {
    let mut descriptors = HAL.registry.lock().clone();
    descriptors.sort_by_key(|d| d.order);

    for descriptor in descriptors {
        let Some(driver) = (descriptor.probe)() else {
            continue;
        };
        match (driver.init)() {
            Ok(kind) => post_init(kind),
            Err(err) => {
                nucleus_core::kerr!("driver {} v{} failed to initialise: {err}", driver.name, driver.version);
            }
        }
    }
}

/// Wires a successfully initialised driver's capabilities into the HAL's
/// active console/TTY state, attaching a freshly-found TTY to whatever
/// console is already active (or vice versa), and applying best-fit
/// font/logo selection and the `consoleFont`/`consoleLogo` command-line
/// overrides.
fn post_init(kind: DriverKind) {
    match kind {
        DriverKind::Console(console) => install_console(console),
        DriverKind::Tty(tty) => install_tty(tty),
        DriverKind::ConsoleAndTty(console, tty) => {
            install_console(console);
            install_tty(tty);
        }
        DriverKind::Other => {}
    }
}

fn install_console(console: Arc<dyn Console>) {
    apply_font_selection(&console);
    apply_logo_selection(&console);

    let became_active = {
        let mut active_console = HAL.active_console.lock();
        if active_console.is_none() {
            *active_console = Some(console.clone());
            true
        } else {
            false
        }
    };
    if !became_active {
        return;
    }

    if let Some(tty) = HAL.active_tty.lock().clone() {
        tty.attach_to(Some(console));
        redirect_log_sink();
    }
}

fn install_tty(tty: Arc<dyn Tty>) {
    let became_active = {
        let mut active_tty = HAL.active_tty.lock();
        if active_tty.is_none() {
            *active_tty = Some(tty.clone());
            true
        } else {
            false
        }
    };
    if !became_active {
        return;
    }

    if let Some(console) = HAL.active_console.lock().clone() {
        tty.attach_to(Some(console));
    }
    tty.set_state(nucleus_driver_api::TtyState::Active);
    redirect_log_sink();
}

fn cmdline_value(key: &str) -> Option<String> {
    multiboot::boot_cmdline().get(key).cloned()
}

/// Applies `consoleFont=<name>` if present, else the best pixel-distance
/// match against the console's own size; a cmdline value matching no
/// registered font name falls back to best-fit as well.
fn apply_font_selection(console: &Arc<dyn Console>) {
    let fonts = HAL.fonts.lock();
    if fonts.is_empty() {
        return;
    }
    let (width, height) = console.dimensions(nucleus_driver_api::DimensionUnit::Pixels);

    let chosen = cmdline_value("consoleFont")
        .and_then(|name| fonts.iter().find(|f| f.name == name))
        .or_else(|| best_fit(fonts.as_slice(), (width, height)));

    if let Some(font) = chosen {
        console.set_font(font);
    }
}

/// Applies best-fit logo selection, unless `consoleLogo=off` is set.
fn apply_logo_selection(console: &Arc<dyn Console>) {
    if cmdline_value("consoleLogo").as_deref() == Some("off") {
        return;
    }
    let logos = HAL.logos.lock();
    if logos.is_empty() {
        return;
    }
    let (width, height) = console.dimensions(nucleus_driver_api::DimensionUnit::Pixels);
    if let Some(logo) = best_fit(logos.as_slice(), (width, height)) {
        console.set_logo(logo);
    }
}

/// Points the kernel log sink's `kprint!`/`klog!` macros at the active TTY,
/// so the rest of the boot sequence and every later log call lands on
/// screen without any call site caring which sink is live.
///
/// The two sink functions below close over nothing; each looks up the
/// HAL's current `active_tty` on every call, so re-registering on every
/// `install_tty`/`install_console` is harmless and keeps the sink current
/// even if the active TTY is later replaced.
fn redirect_log_sink() {
    // SAFETY: these functions are safe to call from any context the kernel
    // may log from, including with interrupts disabled; they only take a
    // lock already used for that purpose elsewhere in this module.
    unsafe {
        nucleus_core::log::set_print_fn(sink_print);
        nucleus_core::log::set_log_fn(sink_log);
    }
}

fn write_str_to_tty(tty: &Arc<dyn Tty>, s: &str) {
    for byte in s.bytes() {
        if tty.write(byte).is_err() {
            return;
        }
    }
}

fn sink_print(args: core::fmt::Arguments<'_>) {
    if let Some(tty) = active_tty() {
        let mut buf = String::new();
        let _ = core::fmt::Write::write_fmt(&mut buf, args);
        write_str_to_tty(&tty, &buf);
    }
}

fn sink_log(level: nucleus_core::log::LogLevel, args: core::fmt::Arguments<'_>) {
    if let Some(tty) = active_tty() {
        let mut buf = String::new();
        let _ = core::fmt::Write::write_fmt(&mut buf, format_args!("[{}] ", level.name()));
        let _ = core::fmt::Write::write_fmt(&mut buf, args);
        buf.push('\n');
        write_str_to_tty(&tty, &buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use nucleus_driver_api::DriverOrder;

    fn probe_none(order: i8) -> DriverDescriptor {
        DriverDescriptor {
            order,
            probe: || None,
        }
    }

    #[test]
    fn driver_order_reserved_values_sort_ascending() {
        let mut orders = [
            DriverOrder::Acpi as i8,
            DriverOrder::Last as i8,
            DriverOrder::BeforeAcpi as i8,
            DriverOrder::Early as i8,
        ];
        orders.sort();
        assert_eq!(
            orders,
            [
                DriverOrder::Early as i8,
                DriverOrder::BeforeAcpi as i8,
                DriverOrder::Acpi as i8,
                DriverOrder::Last as i8,
            ]
        );
    }

    #[test]
    fn equal_order_ties_keep_registration_order() {
        let mut descriptors = vec![probe_none(0), probe_none(0), probe_none(-1)];
        descriptors.sort_by_key(|d| d.order);
        assert_eq!(descriptors[0].order, -1);
        assert_eq!(descriptors[1].order, 0);
        assert_eq!(descriptors[2].order, 0);
    }

    #[test]
    fn driver_kind_other_is_ignored_by_post_init() {
        post_init(DriverKind::Other);
    }
}
