//! Tera raid automation table.
//!
//! Loops random online raids: open the menu, enter the portal, join a raid,
//! battle through it, catch, repeat. Coordinates and colors are authored
//! against the 720x1280 reference grid.

use anyhow::Result;

use crate::action::{do_all, press, wait, Action};
use crate::capture::Frame;
use crate::classify::TemplateCatalog;
use crate::color::Color;
use crate::engine::{Rule, Session, StateTable};
use crate::geometry::Point;
use crate::link::Button;
use crate::matcher::{all_match, always_matches, any_match, pixel_match, text_match, Matcher};

/// The colored stripe behind the raid banner; its color identifies the raid
/// flavor and its disappearance signals the battle actually started.
pub const RAID_STRIPE_POS: Point = Point::new(98, 664);

/// Types whose raids are fought with the physical-attacker move plan.
const PHYSICAL_TYPES: [&str; 9] = [
    "dark", "dragon", "electric", "grass", "ground", "ice", "normal", "rock", "steel",
];

/// Fires when a raid banner has appeared: remembers the stripe color so
/// `MarkerGone` can watch for it, classifies the tera type, and picks the
/// matching battle preparation.
struct RaidAppeared {
    catalog: TemplateCatalog,
}

impl Action for RaidAppeared {
    fn execute(&self, session: &mut Session) -> Result<()> {
        wait(1.0).execute(session)?;

        let frame = session.source.capture()?;
        let stripe = frame.pixel(RAID_STRIPE_POS.norm(frame.dims()));
        session.marker_color = Some(stripe);

        let (tera_type, score) = self.catalog.classify(&frame)?;
        crate::log(&format!("the type is {} (agreement {:.3})", tera_type, score));

        let plan = if PHYSICAL_TYPES.contains(&tera_type.as_str()) {
            // Swap in the physical attacker before accepting
            do_all(vec![
                press(Button::Down),
                wait(1.0),
                press(Button::A),
                wait(5.0),
                press(Button::Down),
                wait(1.0),
                press(Button::Left),
                wait(1.0),
                press(Button::A),
                wait(1.0),
                press(Button::A),
                wait(5.0),
                press(Button::Up),
                wait(1.0),
                press(Button::A),
            ])
        } else {
            press(Button::A)
        };
        plan.execute(session)
    }
}

/// True once the remembered stripe color is no longer at `RAID_STRIPE_POS`.
struct MarkerGone;

impl Matcher for MarkerGone {
    fn matches(&self, frame: &Frame, session: &Session) -> Result<bool> {
        let Some(marker) = session.marker_color else {
            return Ok(true);
        };
        let observed = frame.pixel(RAID_STRIPE_POS.norm(frame.dims()));
        Ok(!observed.within_tolerance(marker, crate::color::DEFAULT_TOLERANCE))
    }
}

/// Builds the raid state table. The catalog is consulted each time a raid
/// banner appears.
pub fn build_states(catalog: TemplateCatalog) -> StateTable {
    let mut states = StateTable::new();

    states.add(
        "INITIAL",
        vec![Rule::new(
            pixel_match(Point::new(399, 696), vec![Color::new(17, 203, 244)]),
            do_all(vec![
                wait(1.0),
                press(Button::X),
                wait(1.0),
                press(Button::Right),
                wait(0.5),
            ]),
            "MENU",
        )],
    );

    states.add(
        "MENU",
        vec![
            Rule::new(
                pixel_match(Point::new(230, 700), vec![Color::new(29, 184, 210)]),
                do_all(vec![wait(1.0), press(Button::A)]),
                "WAIT_FOR_PORTAL",
            ),
            Rule::new(
                always_matches(),
                do_all(vec![press(Button::Down), wait(0.5)]),
                "MENU",
            ),
        ],
    );

    states.add(
        "WAIT_FOR_PORTAL",
        vec![Rule::new(
            pixel_match(Point::new(451, 115), vec![Color::new(29, 163, 217)]),
            // model takes a while to load
            wait(5.0),
            "PORTAL",
        )],
    );

    states.add(
        "PORTAL",
        vec![
            Rule::new(
                pixel_match(Point::new(210, 200), vec![Color::new(22, 198, 229)]),
                do_all(vec![wait(1.0), press(Button::A)]),
                "WAIT_FOR_RAID_SELECT",
            ),
            Rule::new(
                always_matches(),
                do_all(vec![press(Button::Down), wait(0.5)]),
                "PORTAL",
            ),
        ],
    );

    states.add(
        "WAIT_FOR_RAID_SELECT",
        vec![Rule::new(
            pixel_match(
                Point::new(451, 115),
                vec![
                    Color::new(156, 43, 133), // violet
                    Color::new(33, 98, 197),  // scarlet
                ],
            ),
            wait(1.0),
            "RAID_SELECT",
        )],
    );

    states.add(
        "RAID_SELECT",
        // TODO: select based on the disabled join button instead of blindly
        // taking the first slot
        vec![Rule::new(
            always_matches(),
            do_all(vec![
                press(Button::Left),
                wait(0.4),
                press(Button::Down),
                wait(0.4),
                press(Button::A),
                wait(0.4),
            ]),
            "WAIT_FOR_RAID",
        )],
    );

    states.add(
        "WAIT_FOR_RAID",
        vec![
            Rule::new(
                all_match(vec![
                    pixel_match(Point::new(398, 394), vec![Color::new(49, 43, 30)]),
                    text_match(
                        "You weren't able to join.",
                        Point::new(352, 211),
                        Point::new(398, 394),
                        true,
                    ),
                ]),
                do_all(vec![
                    wait(0.5),
                    press(Button::B),
                    wait(0.5),
                    press(Button::A),
                ]),
                "WAIT_FOR_RAID",
            ),
            Rule::new(
                text_match(
                    "If you join a random Tera Raid Battle but then",
                    Point::new(362, 208),
                    Point::new(391, 531),
                    true,
                ),
                do_all(vec![
                    wait(1.0),
                    press(Button::A),
                    wait(1.0),
                    press(Button::A),
                    wait(1.0),
                    press(Button::A),
                ]),
                "WAIT_FOR_RAID_SELECT",
            ),
            Rule::new(
                text_match(
                    "Please try again later.",
                    Point::new(241, 224),
                    Point::new(266, 390),
                    true,
                ),
                do_all(vec![
                    wait(1.0),
                    press(Button::A),
                    wait(2.0),
                    press(Button::A),
                    wait(1.0),
                    press(Button::A),
                ]),
                "WAIT_FOR_RAID",
            ),
            Rule::new(
                text_match(
                    "Please start again from the beginning.",
                    Point::new(237, 233),
                    Point::new(257, 517),
                    true,
                ),
                do_all(vec![
                    wait(1.0),
                    press(Button::A),
                    wait(2.0),
                    press(Button::A),
                    wait(1.0),
                    press(Button::A),
                ]),
                "WAIT_FOR_RAID",
            ),
            Rule::new(
                all_match(vec![
                    pixel_match(RAID_STRIPE_POS, vec![Color::new(20, 184, 227)]),
                    text_match(
                        "Even if you are victorious in this Tera Raid Battle,",
                        Point::new(365, 211),
                        Point::new(387, 551),
                        true,
                    ),
                ]),
                do_all(vec![wait(3.0), press(Button::A)]),
                "WAIT_FOR_RAID",
            ),
            Rule::new(
                pixel_match(
                    RAID_STRIPE_POS,
                    vec![
                        Color::new(211, 108, 153), // violet
                        Color::new(60, 82, 217),   // scarlet
                        Color::new(134, 99, 86),   // 6 star
                        Color::new(20, 184, 227),  // event
                    ],
                ),
                Box::new(RaidAppeared { catalog }),
                "RAID_ACCEPTED",
            ),
        ],
    );

    states.add(
        "RAID_ACCEPTED",
        vec![
            Rule::new(
                all_match(vec![
                    pixel_match(Point::new(393, 432), vec![Color::new(49, 43, 30)]),
                    text_match(
                        "The raid has been abandoned!",
                        Point::new(363, 210),
                        Point::new(393, 432),
                        true,
                    ),
                ]),
                do_all(vec![press(Button::B), wait(1.0), press(Button::A)]),
                "WAIT_FOR_RAID",
            ),
            Rule::new(Box::new(MarkerGone), wait(5.0), "RAID"),
        ],
    );

    states.add(
        "RAID",
        vec![
            Rule::new(
                all_match(vec![
                    pixel_match(Point::new(353, 630), vec![Color::new(31, 196, 221)]),
                    text_match(
                        "Battle",
                        Point::new(353, 629),
                        Point::new(377, 674),
                        false,
                    ),
                ]),
                do_all(vec![press(Button::A), wait(0.2)]),
                "RAID",
            ),
            Rule::new(
                all_match(vec![
                    pixel_match(Point::new(356, 488), vec![Color::new(244, 237, 220)]),
                    pixel_match(Point::new(271, 713), vec![Color::new(31, 183, 200)]),
                ]),
                do_all(vec![
                    wait(0.3),
                    press(Button::R),
                    wait(0.3),
                    press(Button::A),
                    wait(0.3),
                ]),
                "RAID",
            ),
            Rule::new(
                all_match(vec![
                    pixel_match(Point::new(267, 591), vec![Color::new(46, 200, 213)]),
                    any_match(vec![
                        text_match(
                            "Collision Course",
                            Point::new(267, 591),
                            Point::new(290, 693),
                            false,
                        ),
                        text_match(
                            "Electro Drift",
                            Point::new(268, 591),
                            Point::new(289, 669),
                            false,
                        ),
                    ]),
                ]),
                do_all(vec![press(Button::A), wait(0.2)]),
                "RAID",
            ),
            Rule::new(
                all_match(vec![
                    pixel_match(Point::new(98, 435), vec![Color::new(26, 188, 212)]),
                    pixel_match(Point::new(149, 432), vec![Color::new(34, 181, 213)]),
                ]),
                do_all(vec![press(Button::A), wait(0.2)]),
                "RAID",
            ),
            Rule::new(
                all_match(vec![
                    pixel_match(Point::new(393, 627), vec![Color::new(28, 181, 208)]),
                    text_match(
                        "Catch",
                        Point::new(393, 627),
                        Point::new(415, 672),
                        false,
                    ),
                ]),
                do_all(vec![
                    wait(0.5),
                    press(Button::Down),
                    wait(0.5),
                    press(Button::A),
                    wait(8.0),
                ]),
                "WAIT_FOR_SUCCESS",
            ),
            Rule::new(
                all_match(vec![
                    pixel_match(Point::new(381, 515), vec![Color::new(152, 152, 146)]),
                    pixel_match(Point::new(5, 5), vec![Color::new(234, 234, 234)]),
                    text_match(
                        "You and the others were blown out of the cavern!",
                        Point::new(353, 111),
                        Point::new(380, 457),
                        true,
                    ),
                ]),
                wait(10.0),
                "INITIAL",
            ),
        ],
    );

    states.add(
        "WAIT_FOR_SUCCESS",
        vec![Rule::new(
            pixel_match(
                Point::new(115, 674),
                vec![
                    Color::new(211, 108, 153), // violet
                    Color::new(60, 82, 217),   // scarlet
                    Color::new(114, 85, 76),   // 6 star
                    Color::new(64, 191, 229),  // event
                ],
            ),
            do_all(vec![wait(1.0), press(Button::A), wait(10.0)]),
            "INITIAL",
        )],
    );

    states
}
