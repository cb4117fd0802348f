use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use resvg::usvg::{self, Transform};
use tiny_skia::Pixmap;
use tokio::sync::{mpsc, oneshot};

use super::engine::{EngineError, EngineHandle, EngineSurface, RenderEngine};
use crate::assets::AssetLoader;

/// Production rendering engine.
///
/// Each launched session is a dedicated OS thread that owns the loaded
/// font database and all pixel buffers, serving commands over a
/// channel. Building the font database is what makes launching
/// expensive; once a session is up, renders against it are cheap.
/// Thread death is observed as closed channels and surfaces as
/// [`EngineError::Disconnected`].
pub struct RasterEngine {
    fonts: Vec<(String, Cow<'static, [u8]>)>,
}

impl RasterEngine {
    /// Engine with system fonts only.
    pub fn new() -> Self {
        Self { fonts: Vec::new() }
    }

    /// Engine whose sessions load embedded and filesystem fonts ahead
    /// of system fonts.
    pub fn from_assets(loader: &AssetLoader) -> Self {
        Self {
            fonts: loader.get_fonts(),
        }
    }
}

impl Default for RasterEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderEngine for RasterEngine {
    async fn launch(&self) -> Result<Box<dyn EngineHandle>, EngineError> {
        let fonts = self.fonts.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        std::thread::Builder::new()
            .name("affiche-raster".to_string())
            .spawn(move || raster_thread(fonts, rx, ready_tx))
            .map_err(|e| EngineError::Launch(e.to_string()))?;

        match ready_rx.await {
            Ok(font_count) => {
                tracing::info!(font_count, "Raster engine session ready");
                Ok(Box::new(RasterHandle { tx }))
            }
            Err(_) => Err(EngineError::Launch(
                "raster thread died during startup".to_string(),
            )),
        }
    }
}

struct RasterHandle {
    tx: mpsc::UnboundedSender<EngineCommand>,
}

#[async_trait]
impl EngineHandle for RasterHandle {
    async fn create_surface(
        &self,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn EngineSurface>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::CreateSurface {
                width,
                height,
                reply: reply_tx,
            })
            .map_err(|_| EngineError::Disconnected)?;

        let id = reply_rx.await.map_err(|_| EngineError::Disconnected)??;
        Ok(Box::new(RasterSurface {
            id,
            tx: self.tx.clone(),
            released: false,
        }))
    }

    async fn close(&self) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::Shutdown { reply: reply_tx })
            .map_err(|_| EngineError::Disconnected)?;
        reply_rx.await.map_err(|_| EngineError::Disconnected)
    }
}

struct RasterSurface {
    id: u64,
    tx: mpsc::UnboundedSender<EngineCommand>,
    released: bool,
}

#[async_trait]
impl EngineSurface for RasterSurface {
    async fn load_markup(&mut self, svg: String) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::LoadMarkup {
                id: self.id,
                svg,
                reply: reply_tx,
            })
            .map_err(|_| EngineError::Disconnected)?;
        reply_rx.await.map_err(|_| EngineError::Disconnected)?
    }

    async fn capture(&mut self) -> Result<Vec<u8>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::Capture {
                id: self.id,
                reply: reply_tx,
            })
            .map_err(|_| EngineError::Disconnected)?;
        reply_rx.await.map_err(|_| EngineError::Disconnected)?
    }

    async fn close(&mut self) -> Result<(), EngineError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::CloseSurface {
                id: self.id,
                reply: reply_tx,
            })
            .map_err(|_| EngineError::Disconnected)?;
        reply_rx.await.map_err(|_| EngineError::Disconnected)
    }
}

impl Drop for RasterSurface {
    fn drop(&mut self) {
        // Last-resort release if close() was skipped; the thread-side
        // slot would otherwise live until session shutdown.
        if !self.released {
            let (reply_tx, _reply_rx) = oneshot::channel();
            let _ = self.tx.send(EngineCommand::CloseSurface {
                id: self.id,
                reply: reply_tx,
            });
        }
    }
}

enum EngineCommand {
    CreateSurface {
        width: u32,
        height: u32,
        reply: oneshot::Sender<Result<u64, EngineError>>,
    },
    LoadMarkup {
        id: u64,
        svg: String,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Capture {
        id: u64,
        reply: oneshot::Sender<Result<Vec<u8>, EngineError>>,
    },
    CloseSurface {
        id: u64,
        reply: oneshot::Sender<()>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct SurfaceSlot {
    pixmap: Pixmap,
    tree: Option<usvg::Tree>,
}

fn raster_thread(
    fonts: Vec<(String, Cow<'static, [u8]>)>,
    mut rx: mpsc::UnboundedReceiver<EngineCommand>,
    ready: oneshot::Sender<usize>,
) {
    let mut fontdb = fontdb::Database::new();
    for (name, data) in fonts {
        fontdb.load_font_data(data.into_owned());
        tracing::debug!(font = %name, "Loaded font");
    }
    // System fonts as fallback
    fontdb.load_system_fonts();
    let fontdb = Arc::new(fontdb);

    if ready.send(fontdb.len()).is_err() {
        // Launcher gave up waiting; nothing to serve.
        return;
    }

    let mut surfaces: HashMap<u64, SurfaceSlot> = HashMap::new();
    let mut next_id: u64 = 1;

    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            EngineCommand::CreateSurface {
                width,
                height,
                reply,
            } => {
                let result = Pixmap::new(width, height)
                    .map(|pixmap| {
                        let id = next_id;
                        next_id += 1;
                        surfaces.insert(id, SurfaceSlot { pixmap, tree: None });
                        id
                    })
                    .ok_or_else(|| {
                        EngineError::Surface(format!("cannot allocate {width}x{height} surface"))
                    });
                let _ = reply.send(result);
            }
            EngineCommand::LoadMarkup { id, svg, reply } => {
                let _ = reply.send(load_markup(&mut surfaces, &fontdb, id, &svg));
            }
            EngineCommand::Capture { id, reply } => {
                let _ = reply.send(capture(&mut surfaces, id));
            }
            EngineCommand::CloseSurface { id, reply } => {
                surfaces.remove(&id);
                let _ = reply.send(());
            }
            EngineCommand::Shutdown { reply } => {
                let _ = reply.send(());
                break;
            }
        }
    }

    tracing::debug!(open_surfaces = surfaces.len(), "Raster engine session stopped");
}

fn load_markup(
    surfaces: &mut HashMap<u64, SurfaceSlot>,
    fontdb: &Arc<fontdb::Database>,
    id: u64,
    svg: &str,
) -> Result<(), EngineError> {
    let slot = surfaces
        .get_mut(&id)
        .ok_or_else(|| EngineError::Surface(format!("no surface {id}")))?;

    let options = usvg::Options {
        fontdb: fontdb.clone(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_data(svg.as_bytes(), &options)
        .map_err(|e| EngineError::Markup(e.to_string()))?;

    let size = tree.size();
    if size.width().round() as u32 != slot.pixmap.width()
        || size.height().round() as u32 != slot.pixmap.height()
    {
        tracing::debug!(
            markup_width = size.width(),
            markup_height = size.height(),
            surface_width = slot.pixmap.width(),
            surface_height = slot.pixmap.height(),
            "Markup size differs from surface; drawing at native scale, clipped"
        );
    }

    slot.tree = Some(tree);
    Ok(())
}

fn capture(surfaces: &mut HashMap<u64, SurfaceSlot>, id: u64) -> Result<Vec<u8>, EngineError> {
    let slot = surfaces
        .get_mut(&id)
        .ok_or_else(|| EngineError::Surface(format!("no surface {id}")))?;
    let tree = slot
        .tree
        .as_ref()
        .ok_or_else(|| EngineError::Capture("no content loaded".to_string()))?;

    // Fresh background each capture so a repeat capture does not
    // composite over the previous pass.
    slot.pixmap.fill(tiny_skia::Color::WHITE);

    // Identity transform: markup draws at native scale and anything
    // outside the surface rect is clipped.
    resvg::render(tree, Transform::default(), &mut slot.pixmap.as_mut());

    encode_rgba_png(&slot.pixmap)
}

/// Encode the pixmap as 8-bit RGBA PNG. The white fill leaves every
/// pixel opaque, so the premultiplied buffer encodes correctly as-is.
fn encode_rgba_png(pixmap: &Pixmap) -> Result<Vec<u8>, EngineError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| EngineError::Capture(e.to_string()))?;
        writer
            .write_image_data(pixmap.data())
            .map_err(|e| EngineError::Capture(e.to_string()))?;
    }
    Ok(buf.into_inner())
}
