//! Click-to-activate: highlights the figure and axes under the mouse
//! and makes a click route subsequent objects there.
//!
//! Only one instance exists at a time; attaching a new one removes the
//! previous instance and restores its colors first.

use kurbo::Point;
use overplot_core::{
    Action, AxesId, Backend, Color, Error, Event, EventCtx, FigureId, InteractiveShape,
    ObjectId, ObjectOptions, ObjectState, Session, TypeTag,
};
use std::any::{Any, TypeId};
use std::collections::HashMap;

const FIGURE_HIGHLIGHT: Color = Color::rgb(0xf3, 0xf8, 0xfa);
const AXES_HIGHLIGHT: Color = Color::rgb(0xec, 0xf4, 0xf8);

/// Construction options for [`ClickFig`].
#[derive(Debug, Clone, Default)]
pub struct ClickFigOptions {
    /// Remove the highlighter after this many activating clicks.
    pub max_clicks: Option<usize>,
}

/// Figure and axes activation by mouse click.
pub struct ClickFig {
    fig_colors: HashMap<FigureId, Color>,
    ax_colors: HashMap<AxesId, Color>,
    max_clicks: Option<usize>,
    clicks: usize,
}

impl ClickFig {
    /// Creates the highlighter and hooks it up to every open figure.
    pub fn attach(session: &mut Session, options: ClickFigOptions) -> Result<ObjectId, Error> {
        for other in session.class_objects::<ClickFig>() {
            session.delete(other);
        }

        let mut fig_colors = HashMap::new();
        let mut ax_colors = HashMap::new();
        let figures = session.backend_ref().figures();
        for &fig in &figures {
            fig_colors.insert(fig, session.backend_ref().figure_facecolor(fig));
            for ax in session.backend_ref().axes_of(fig) {
                ax_colors.insert(ax, session.backend_ref().axes_facecolor(ax));
            }
        }

        let clickfig = ClickFig {
            fig_colors,
            ax_colors,
            max_clicks: options.max_clicks,
            clicks: 0,
        };
        let id = session.add(
            Box::new(clickfig),
            ObjectOptions {
                blit: false,
                ..Default::default()
            },
        )?;
        // `add` connects the home figure; listen everywhere else too.
        let home = session.state(id).map(|state| state.figure);
        for fig in figures {
            if Some(fig) != home {
                session.connect(id, fig)?;
            }
        }
        Ok(id)
    }

    /// Activating clicks seen so far.
    pub fn clicks(&self) -> usize {
        self.clicks
    }
}

impl InteractiveShape for ClickFig {
    fn type_tag(&self) -> TypeTag {
        TypeId::of::<ClickFig>()
    }

    fn label(&self) -> &'static str {
        "clickfig"
    }

    fn create(
        &mut self,
        _obj: &mut ObjectState,
        _backend: &mut dyn Backend,
        _at: Option<Point>,
        _blit: bool,
    ) {
    }

    fn update_position(
        &mut self,
        _obj: &mut ObjectState,
        _backend: &mut dyn Backend,
        _event: &Event,
    ) {
    }

    fn on_figure_enter(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        ctx.backend.set_figure_facecolor(event.figure, FIGURE_HIGHLIGHT);
        ctx.backend.draw(event.figure);
    }

    fn on_figure_leave(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        if let Some(&color) = self.fig_colors.get(&event.figure) {
            ctx.backend.set_figure_facecolor(event.figure, color);
            ctx.backend.draw(event.figure);
        }
    }

    fn on_axes_enter(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let Some(axes) = event.axes else {
            return;
        };
        ctx.backend.set_axes_facecolor(axes, AXES_HIGHLIGHT);
        ctx.backend.draw(event.figure);
    }

    fn on_axes_leave(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let Some(axes) = event.axes else {
            return;
        };
        if let Some(&color) = self.ax_colors.get(&axes) {
            ctx.backend.set_axes_facecolor(axes, color);
            ctx.backend.draw(event.figure);
        }
    }

    fn on_mouse_press(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        ctx.obj.figure = event.figure;
        if let Some(axes) = event.axes {
            ctx.obj.axes = axes;
        }
        ctx.queue(Action::Activate);
        self.clicks += 1;
        if self.max_clicks.is_some_and(|max| self.clicks >= max) {
            log::info!("clickfig reached its click limit, removing");
            ctx.queue(Action::Delete);
        }
    }

    fn on_removed(&mut self, backend: &mut dyn Backend) {
        for (&fig, &color) in &self.fig_colors {
            backend.set_figure_facecolor(fig, color);
        }
        for (&ax, &color) in &self.ax_colors {
            backend.set_axes_facecolor(ax, color);
        }
        for fig in backend.figures() {
            backend.draw(fig);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
