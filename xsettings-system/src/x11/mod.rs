//! X11 backend of the display-server port.
//!
//! The manager owns an InputOnly window on the served screen. The
//! `_XSETTINGS_SETTINGS` property lives on that window, and the window owns
//! the `_XSETTINGS_S<screen>` selection so that clients can find it.

use std::fmt::Display;

use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    Atom, ClientMessageEvent, ConnectionExt as _, CreateWindowAux, EventMask, PropMode, Window, WindowClass,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, COPY_FROM_PARENT, CURRENT_TIME, NONE};

use xsettings_domain::display::{DisplayServer, DisplayServerError};

const SETTINGS_ATOM_NAME: &[u8] = b"_XSETTINGS_SETTINGS";
const MANAGER_ATOM_NAME: &[u8] = b"MANAGER";

/// `GetOutputPrimary` needs RandR 1.3.
const RANDR_MAJOR: u32 = 1;
const RANDR_MINOR: u32 = 3;

/// Name of the selection that marks the settings manager of `screen`.
pub fn selection_name(screen: usize) -> String {
    format!("_XSETTINGS_S{}", screen)
}

#[derive(Debug, Clone, Copy)]
struct Atoms {
    selection: Atom,
    settings: Atom,
    manager: Atom,
}

pub struct X11DisplayServer {
    conn: RustConnection,
    screen_num: usize,
    root: Window,
    owner: Window,
    atoms: Atoms,
}

impl X11DisplayServer {
    /// Connects to `$DISPLAY` and creates the owner window on `screen`
    /// (the display's default screen when `None`). The selection is not
    /// claimed yet, see [`X11DisplayServer::claim_selection`].
    pub fn connect(screen: Option<usize>) -> Result<Self, DisplayServerError> {
        let (conn, default_screen) =
            RustConnection::connect(None).map_err(wrap(DisplayServerError::Connection, "X11 connect failed"))?;
        let screen_num = screen.unwrap_or(default_screen);
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|s| s.root)
            .ok_or_else(|| DisplayServerError::Connection(format!("Screen {} does not exist", screen_num)))?;

        let version = conn
            .randr_query_version(RANDR_MAJOR, RANDR_MINOR)
            .map_err(wrap(DisplayServerError::Connection, "randr_query_version"))?
            .reply()
            .map_err(wrap(DisplayServerError::Connection, "RandR is not available"))?;
        debug!("RandR {}.{}", version.major_version, version.minor_version);

        let atoms = Atoms {
            selection: intern_atom(&conn, selection_name(screen_num).as_bytes())?,
            settings: intern_atom(&conn, SETTINGS_ATOM_NAME)?,
            manager: intern_atom(&conn, MANAGER_ATOM_NAME)?,
        };

        let owner = conn.generate_id().map_err(wrap(DisplayServerError::Connection, "generate_id"))?;
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            owner,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            COPY_FROM_PARENT,
            &CreateWindowAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )
        .map_err(wrap(DisplayServerError::Connection, "create_window"))?
        .check()
        .map_err(wrap(DisplayServerError::Connection, "create_window"))?;

        info!("Connected to X11 screen {}, settings window 0x{:x}", screen_num, owner);
        Ok(Self { conn, screen_num, root, owner, atoms })
    }

    pub fn screen_num(&self) -> usize {
        self.screen_num
    }

    /// Takes the `_XSETTINGS_S<screen>` selection and announces it with a
    /// `MANAGER` client message on the root window.
    ///
    /// Fails if another client owns the selection, unless `replace` is set.
    pub fn claim_selection(&self, replace: bool) -> Result<(), DisplayServerError> {
        let current = self.selection_owner()?;
        if current != NONE && current != self.owner {
            if !replace {
                return Err(DisplayServerError::Connection(format!(
                    "{} is already owned by window 0x{:x}",
                    selection_name(self.screen_num),
                    current
                )));
            }
            warn!("Replacing the settings manager on window 0x{:x}", current);
        }

        self.conn
            .set_selection_owner(self.owner, self.atoms.selection, CURRENT_TIME)
            .map_err(wrap(DisplayServerError::Connection, "set_selection_owner"))?
            .check()
            .map_err(wrap(DisplayServerError::Connection, "set_selection_owner"))?;
        if self.selection_owner()? != self.owner {
            return Err(DisplayServerError::Connection(format!(
                "Could not take {}",
                selection_name(self.screen_num)
            )));
        }

        let event = ClientMessageEvent::new(
            32,
            self.root,
            self.atoms.manager,
            [CURRENT_TIME, self.atoms.selection, self.owner, 0, 0],
        );
        self.conn
            .send_event(false, self.root, EventMask::STRUCTURE_NOTIFY, event)
            .map_err(wrap(DisplayServerError::Connection, "send_event"))?;
        self.conn.flush().map_err(wrap(DisplayServerError::Connection, "flush"))?;
        info!("Took {}", selection_name(self.screen_num));
        Ok(())
    }

    /// Blocks on the X event queue until another manager takes the selection.
    pub fn run_until_replaced(&self) -> Result<(), DisplayServerError> {
        loop {
            let event = self
                .conn
                .wait_for_event()
                .map_err(wrap(DisplayServerError::Connection, "wait_for_event"))?;
            match event {
                Event::SelectionClear(e) if e.selection == self.atoms.selection => {
                    info!("Lost {} to window 0x{:x}, exiting", selection_name(self.screen_num), e.owner);
                    return Ok(());
                }
                Event::Error(e) => warn!("X11 error: {:?}", e),
                other => debug!("Ignoring X11 event {:?}", other),
            }
        }
    }

    fn selection_owner(&self) -> Result<Window, DisplayServerError> {
        Ok(self
            .conn
            .get_selection_owner(self.atoms.selection)
            .map_err(wrap(DisplayServerError::Connection, "get_selection_owner"))?
            .reply()
            .map_err(wrap(DisplayServerError::Connection, "get_selection_owner"))?
            .owner)
    }

    fn output_name(&self, output: randr::Output, timestamp: u32) -> Result<Option<String>, DisplayServerError> {
        let info = self
            .conn
            .randr_get_output_info(output, timestamp)
            .map_err(wrap(DisplayServerError::Monitor, "randr_get_output_info"))?
            .reply()
            .map_err(wrap(DisplayServerError::Monitor, "randr_get_output_info"))?;
        if info.connection != randr::Connection::CONNECTED {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&info.name).into_owned()))
    }
}

impl DisplayServer for X11DisplayServer {
    fn read_property(&self) -> Result<Vec<u8>, DisplayServerError> {
        let reply = self
            .conn
            .get_property(false, self.owner, self.atoms.settings, self.atoms.settings, 0, u32::MAX / 4)
            .map_err(wrap(DisplayServerError::Read, "get_property"))?
            .reply()
            .map_err(wrap(DisplayServerError::Read, "get_property"))?;
        if reply.type_ == NONE {
            return Ok(Vec::new());
        }
        if reply.format != 8 {
            return Err(DisplayServerError::Read(format!("Unexpected property format {}", reply.format)));
        }
        Ok(reply.value)
    }

    fn write_property(&self, data: &[u8]) -> Result<(), DisplayServerError> {
        self.conn
            .change_property8(PropMode::REPLACE, self.owner, self.atoms.settings, self.atoms.settings, data)
            .map_err(wrap(DisplayServerError::Write, "change_property"))?
            .check()
            .map_err(wrap(DisplayServerError::Write, "change_property"))
    }

    fn primary_monitor_name(&self) -> Result<String, DisplayServerError> {
        let primary = self
            .conn
            .randr_get_output_primary(self.root)
            .map_err(wrap(DisplayServerError::Monitor, "randr_get_output_primary"))?
            .reply()
            .map_err(wrap(DisplayServerError::Monitor, "randr_get_output_primary"))?
            .output;
        if primary == NONE {
            return Err(DisplayServerError::NoPrimaryMonitor);
        }
        self.output_name(primary, CURRENT_TIME)?.ok_or(DisplayServerError::NoPrimaryMonitor)
    }

    fn connected_monitor_names(&self) -> Result<Vec<String>, DisplayServerError> {
        let resources = self
            .conn
            .randr_get_screen_resources_current(self.root)
            .map_err(wrap(DisplayServerError::Monitor, "randr_get_screen_resources_current"))?
            .reply()
            .map_err(wrap(DisplayServerError::Monitor, "randr_get_screen_resources_current"))?;

        let mut names = Vec::with_capacity(resources.outputs.len());
        for output in resources.outputs {
            if let Some(name) = self.output_name(output, resources.config_timestamp)? {
                names.push(name);
            }
        }
        Ok(names)
    }
}

fn intern_atom(conn: &RustConnection, name: &[u8]) -> Result<Atom, DisplayServerError> {
    Ok(conn
        .intern_atom(false, name)
        .map_err(wrap(DisplayServerError::Connection, "intern_atom"))?
        .reply()
        .map_err(wrap(DisplayServerError::Connection, "intern_atom"))?
        .atom)
}

/// Adapts an x11rb error into a [`DisplayServerError`] variant.
fn wrap<E: Display>(variant: fn(String) -> DisplayServerError, context: &'static str) -> impl Fn(E) -> DisplayServerError {
    move |e| variant(format!("{}: {}", context, e))
}
