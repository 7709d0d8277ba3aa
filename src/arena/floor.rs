/// Two floor tiles that leapfrog each other as the course scrolls.
#[derive(Clone, Debug, PartialEq)]
pub struct Floor {
    pub y: f64,
    pub x1: f64,
    pub x2: f64,
    width: f64,
}

impl Floor {
    pub fn new(y: f64, width: f64) -> Floor {
        Floor { y, x1: 0., x2: width, width }
    }

    pub fn advance(&mut self, velocity: f64) {
        self.x1 -= velocity;
        self.x2 -= velocity;
        if self.x1 + self.width < 0. {
            self.x1 = self.x2 + self.width;
        }
        if self.x2 + self.width < 0. {
            self.x2 = self.x1 + self.width;
        }
    }
}
