//! Speech synthesis voices.

use serde::{Deserialize, Serialize};

/// Voice used for text-to-speech. Serialized by name, e.g. `"Celine"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceName {
    Aditi,
    Agnieszka,
    Amy,
    Astrid,
    Brian,
    Carla,
    Carmen,
    Celine,
    Chantal,
    Chipmunk,
    Conchita,
    Cristiano,
    Dora,
    Emma,
    Enrique,
    Eric,
    Ewa,
    Filiz,
    Geraint,
    Giorgio,
    Gwyneth,
    Hans,
    Ines,
    Ivy,
    Jacek,
    Jan,
    Jennifer,
    Joey,
    Justin,
    Karl,
    Kendra,
    #[default]
    Kimberly,
    Liv,
    Lotte,
    Mads,
    Maja,
    Marlene,
    Mathieu,
    Maxim,
    Miguel,
    Mizuki,
    Naja,
    Nicole,
    Penelope,
    Raveena,
    Ricardo,
    Ruben,
    Russell,
    Salli,
    Seoyeon,
    Takumi,
    Tatyana,
    Vicki,
    Vitoria,
    Zeina,
    Zhiyu,
}
