pub mod poster;

pub use poster::{__path_handle_poster_image, __path_handle_render_poster};
pub use poster::{
    handle_poster_image, handle_render_poster, PosterErrorResponse, PosterPage, PosterRequest,
    PosterResponse,
};
