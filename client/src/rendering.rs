use crate::config::GameMode;
use crate::network::ConnectionState;
use crate::session::Session;
use macroquad::prelude::*;

const BACKGROUND: Color = Color::new(0.96, 0.96, 0.96, 1.0);
const PLATFORM: Color = Color::new(0.1, 0.1, 0.1, 1.0);
const PORTAL: Color = Color::new(0.55, 0.2, 0.8, 0.8);
const LOCAL_PLAYER: Color = Color::new(0.0, 0.0, 1.0, 1.0);
const REMOTE_PLAYER: Color = Color::new(1.0, 0.0, 0.0, 1.0);

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            width: width as f32,
            height: height as f32,
        }
    }

    fn menu_buttons(&self) -> [(GameMode, Rect, Color); 2] {
        let top = self.height / 2.0 - 50.0;
        [
            (
                GameMode::Singleplayer,
                Rect::new(self.width / 2.0 - 250.0, top, 200.0, 100.0),
                Color::from_rgba(0, 100, 200, 255),
            ),
            (
                GameMode::Multiplayer,
                Rect::new(self.width / 2.0 + 50.0, top, 200.0, 100.0),
                Color::from_rgba(200, 100, 0, 255),
            ),
        ]
    }

    /// Draws the mode selection screen and returns the mode clicked this frame, if any
    pub fn draw_menu(&self) -> Option<GameMode> {
        clear_background(Color::from_rgba(200, 200, 200, 255));
        self.draw_centered("Select Game Mode", self.width / 2.0, self.height / 4.0, 48.0, BLACK);

        let clicked = is_mouse_button_pressed(MouseButton::Left);
        let (mx, my) = mouse_position();
        let mut selected = None;

        for (mode, button, color) in self.menu_buttons() {
            draw_rectangle(button.x, button.y, button.w, button.h, color);
            self.draw_centered(
                mode.title(),
                button.x + button.w / 2.0,
                button.y + button.h / 2.0 + 10.0,
                32.0,
                WHITE,
            );
            if clicked && button.contains(vec2(mx, my)) {
                selected = Some(mode);
            }
        }

        selected
    }

    pub fn render(&self, session: &Session, mode: GameMode) {
        clear_background(BACKGROUND);

        let level = session.level();
        for platform in &level.platforms {
            draw_rectangle(platform.x, platform.y, platform.width, platform.height, PLATFORM);
        }
        if let Some(goal) = level.goal {
            draw_rectangle(goal.x, goal.y, goal.width, goal.height, PORTAL);
        }

        for entity in session.remote_entities() {
            let bounds = entity.bounds();
            draw_rectangle(bounds.x, bounds.y, bounds.width, bounds.height, REMOTE_PLAYER);
            let label = if entity.name.is_empty() {
                entity.id.as_str()
            } else {
                entity.name.as_str()
            };
            self.draw_centered(label, bounds.x + bounds.width / 2.0, bounds.y - 6.0, 18.0, BLACK);
        }

        let player = session.player().bounds();
        draw_rectangle(player.x, player.y, player.width, player.height, LOCAL_PLAYER);

        self.draw_status(session, mode);
        self.draw_leaderboard(session);
    }

    fn draw_status(&self, session: &Session, mode: GameMode) {
        let (status, color) = match mode {
            GameMode::Singleplayer => ("Singleplayer", DARKGRAY),
            GameMode::Multiplayer => match session.connection_state() {
                ConnectionState::Connected => ("Connected", DARKGREEN),
                ConnectionState::Connecting => ("Connecting...", ORANGE),
                ConnectionState::Disconnected => ("Disconnected", RED),
            },
        };

        draw_rectangle(10.0, 10.0, 10.0, 10.0, color);
        draw_text(status, 26.0, 20.0, 20.0, BLACK);
        draw_text(
            &format!(
                "Level {}  Score {}  Players {}",
                session.level_index() + 1,
                session.score(),
                session.remote_entities().count() + 1
            ),
            10.0,
            42.0,
            20.0,
            BLACK,
        );
    }

    fn draw_leaderboard(&self, session: &Session) {
        let entries = session.leaderboard();
        if entries.is_empty() {
            return;
        }

        let x = self.width - 190.0;
        draw_text("Leaderboard", x, 20.0, 20.0, BLACK);
        for (rank, entry) in entries.iter().take(10).enumerate() {
            draw_text(
                &format!("{}. {} - {}", rank + 1, entry.name, entry.score),
                x,
                42.0 + rank as f32 * 20.0,
                18.0,
                BLACK,
            );
        }
    }

    fn draw_centered(&self, text: &str, center_x: f32, y: f32, size: f32, color: Color) {
        let dimensions = measure_text(text, None, size as u16, 1.0);
        draw_text(text, center_x - dimensions.width / 2.0, y, size, color);
    }
}
