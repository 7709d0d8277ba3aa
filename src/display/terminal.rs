use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use itertools::Itertools;

use super::{Flow, FrameView, PresentationSink};

/// Renders the course as a character grid, one cell per `field / grid` pixels.
pub fn frame_to_string(frame: &FrameView<'_>, cols: usize, rows: usize, agent_size: (f64, f64)) -> String {
    let settings = frame.settings;
    let cell_w = settings.field_width / cols as f64;
    let cell_h = settings.field_height / rows as f64;
    let obstacle_w = frame.track.sprite_width();
    let (agent_w, agent_h) = agent_size;

    // guide lines from each agent to the edges of the gap it observes
    let mut guide = vec![false; cols * rows];
    if frame.reference < frame.track.len() {
        let target = &frame.track[frame.reference];
        let target_x = target.x + obstacle_w / 2.;
        for agent in frame.alive_agents() {
            let from = (agent.x + agent_w / 2., agent.y + agent_h / 2.);
            for to in [(target_x, target.gap_center), (target_x, target.bottom_bound)] {
                let (dx, dy) = (to.0 - from.0, to.1 - from.1);
                let steps = ((dx.abs() / cell_w).max(dy.abs() / cell_h) * 2.).ceil().max(1.) as usize;
                for i in 0..=steps {
                    let t = i as f64 / steps as f64;
                    let (px, py) = (from.0 + dx * t, from.1 + dy * t);
                    if px < 0. || py < 0. {
                        continue;
                    }
                    let (c, r) = ((px / cell_w) as usize, (py / cell_h) as usize);
                    if c < cols && r < rows {
                        guide[r * cols + c] = true;
                    }
                }
            }
        }
    }

    let cell_char = |c: usize, r: usize| -> char {
        let px = (c as f64 + 0.5) * cell_w;
        let py = (r as f64 + 0.5) * cell_h;
        if py >= frame.floor.y {
            return '=';
        }
        let in_agent = frame
            .alive_agents()
            .any(|a| px >= a.x && px < a.x + agent_w && py >= a.y && py < a.y + agent_h);
        if in_agent {
            return '@';
        }
        let in_obstacle = frame
            .track
            .iter()
            .any(|o| px >= o.x && px < o.x + obstacle_w && (py < o.gap_center || py >= o.bottom_bound));
        if in_obstacle {
            '#'
        } else if guide[r * cols + c] {
            '.'
        } else {
            ' '
        }
    };

    let header = format!(
        "Gen: {}  Score: {}  Alive: {}",
        frame.generation,
        frame.score,
        frame.active.len()
    );
    let grid = (0..rows).map(|r| (0..cols).map(|c| cell_char(c, r)).collect::<String>());
    std::iter::once(header).chain(grid).join("\r\n")
}

/// Draws every tick to the terminal, paced to the configured frame rate.
/// `q`, `Esc` or `Ctrl-C` ask the evaluation to stop.
pub struct TerminalSink {
    stdout: Stdout,
    cols: usize,
    rows: usize,
    agent_size: (f64, f64),
    frame_interval: Duration,
    last_frame: Option<Instant>,
}

impl TerminalSink {
    pub fn new(frame_rate: u32, agent_size: (f64, f64)) -> io::Result<TerminalSink> {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(TerminalSink {
            stdout,
            cols: 50,
            rows: 40,
            agent_size,
            frame_interval: Duration::from_secs_f64(1. / frame_rate.max(1) as f64),
            last_frame: None,
        })
    }

    fn pace(&mut self) {
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < self.frame_interval {
                std::thread::sleep(self.frame_interval - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
    }

    fn quit_requested() -> io::Result<bool> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
                if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl PresentationSink for TerminalSink {
    fn present(&mut self, frame: &FrameView<'_>) -> io::Result<Flow> {
        let screen = frame_to_string(frame, self.cols, self.rows, self.agent_size);
        queue!(self.stdout, MoveTo(0, 0), Clear(ClearType::All), Print(screen))?;
        self.stdout.flush()?;

        self.pace();
        if Self::quit_requested()? {
            Ok(Flow::Quit)
        } else {
            Ok(Flow::Continue)
        }
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
